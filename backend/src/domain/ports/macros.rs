//! Helper macro for declaring port error enums.
//!
//! `define_port_error!` derives `thiserror::Error` for the enum and adds one
//! snake_case constructor per variant whose parameters accept anything
//! convertible into the field types, plus a `variant` accessor naming the
//! variant for log fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Variant name, for structured log fields.
            pub const fn variant(&self) -> &'static str {
                match self {
                    $( Self::$variant { .. } => stringify!($variant), )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum ExportPortError {
            Unreadable { message: String } => "export unreadable: {message}",
            Truncated { records: u32 } => "export truncated after {records} records",
            Rejected { message: String, records: u32 } => "export rejected: {message} ({records})",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExportPortError::unreadable("permission denied");
        assert_eq!(err.to_string(), "export unreadable: permission denied");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ExportPortError::truncated(42_u32);
        assert_eq!(err.to_string(), "export truncated after 42 records");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExportPortError::rejected("slug clash", 7_u32);
        assert_eq!(err, ExportPortError::Rejected {
            message: "slug clash".to_owned(),
            records: 7,
        });
        assert_eq!(err.to_string(), "export rejected: slug clash (7)");
    }

    #[test]
    fn variant_names_the_variant() {
        assert_eq!(ExportPortError::truncated(3_u32).variant(), "Truncated");
        assert_eq!(ExportPortError::unreadable("gone").variant(), "Unreadable");
    }
}
