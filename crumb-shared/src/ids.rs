//! Newtype IDs for catalog entities.
//!
//! Every record kind gets its own wrapper around a `Uuid` so that a recipe id
//! can never be handed to an ingredient lookup by accident.

use std::str::FromStr;
use uuid::Uuid;

/// Defines a `Uuid`-backed identifier with serde, display and parsing support.
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing uuid.
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(IngredientId);
define_id!(RecipeId);
define_id!(PackagingId);
define_id!(ProductId);

macro_rules! impl_from_str {
    ($($name:ident),*) => {
        $(
            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Uuid::parse_str(s.trim()).map(Self)
                }
            }
        )*
    };
}

impl_from_str!(IngredientId, RecipeId, PackagingId, ProductId);
