// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Serde-specific utilties

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Mask;

/// Masks are serialized as hex strings since not all formats support the full
/// range of [`u64`]
impl Serialize for Mask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:#x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MaskVisitor)
    }
}

/// [`Visitor`][serde::de::Visitor] for parsing masks
///
/// Accepts non-negative integers, strings holding decimal or (`0x` prefixed)
/// hexadecimal numbers, and the string `"all"`.
struct MaskVisitor;

impl serde::de::Visitor<'_> for MaskVisitor {
    type Value = Mask;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a non-negative integer, a hex string or \"all\"")
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u64::try_from(v)
            .map(Mask)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Mask(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = v.trim();
        let value = if v.eq_ignore_ascii_case("all") {
            Ok(u64::MAX)
        } else if let Some(hex) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else {
            v.parse()
        };
        value
            .map(Mask)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &self))
    }
}
