//! Plain text and text-list payloads.

use super::KnownProperty;

/// A payload holding one text value.
pub trait TextValue: KnownProperty + Default {
    fn from_text(value: String) -> Self;
    fn text(&self) -> &str;
}

/// A payload holding a comma-separated list of text values.
pub trait TextListValue: KnownProperty + Default {
    fn from_values(values: Vec<String>) -> Self;
    fn values(&self) -> &[String];
}

macro_rules! text_property {
    ($(#[$meta:meta])* $ty:ident => $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $ty {
            pub value: String,
        }

        impl $ty {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self { value: value.into() }
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.value
            }
        }

        impl KnownProperty for $ty {
            const NAME: &'static str = $name;
        }

        impl TextValue for $ty {
            fn from_text(value: String) -> Self {
                Self { value }
            }

            fn text(&self) -> &str {
                &self.value
            }
        }
    };
}

macro_rules! text_list_property {
    ($(#[$meta:meta])* $ty:ident => $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $ty {
            pub values: Vec<String>,
        }

        impl $ty {
            #[must_use]
            pub fn new<I, S>(values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Self {
                    values: values.into_iter().map(Into::into).collect(),
                }
            }
        }

        impl KnownProperty for $ty {
            const NAME: &'static str = $name;
        }

        impl TextListValue for $ty {
            fn from_values(values: Vec<String>) -> Self {
                Self { values }
            }

            fn values(&self) -> &[String] {
                &self.values
            }
        }
    };
}

text_property!(
    /// Formatted name (FN).
    FormattedName => "FN"
);
text_property!(Note => "NOTE");
text_property!(Title => "TITLE");
text_property!(Role => "ROLE");
text_property!(Email => "EMAIL");
text_property!(
    /// Telephone number (TEL), kept as free text.
    Telephone => "TEL"
);
text_property!(Url => "URL");
text_property!(Uid => "UID");
text_property!(
    /// Kind of object the vCard represents (4.0).
    Kind => "KIND"
);
text_property!(ProductId => "PRODID");
text_property!(
    /// Mail software used by the person (2.1/3.0).
    Mailer => "MAILER"
);
text_property!(
    /// `PROFILE:VCARD` (3.0).
    Profile => "PROFILE"
);
text_property!(SortString => "SORT-STRING");
text_property!(
    /// Standalone formatted address label (2.1/3.0).
    Label => "LABEL"
);
text_property!(
    /// Access classification (3.0 `CLASS`).
    Classification => "CLASS"
);

text_list_property!(Nickname => "NICKNAME");
text_list_property!(Categories => "CATEGORIES");

impl Profile {
    /// The only value RFC 2426 allows.
    pub const VCARD: &'static str = "VCARD";
}
