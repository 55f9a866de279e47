// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn defaults() {
    let config = Configuration::default();
    assert_eq!(config.print_buffer_limit, 4096);
    assert_eq!(config.print_channels, Mask::ALL);
    assert_eq!(config.core_mask, Mask::ALL);
    assert_eq!(config.verbosity, Verbosity::ALL);
    assert_eq!(config.address_width, AddressWidth::Auto);
    assert_eq!(config.src_bits, 0);
    assert_eq!(config.timestamp_width, 40);
    assert_eq!(config.frequency, None);
    assert_eq!(config.max_run, crate::tracer::DEFAULT_MAX_RUN);
    assert_eq!(config.return_stack, 0);
    assert_eq!(config.source_path, None);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn empty_toml() {
    let config: Configuration = toml::from_str("").expect("Could not parse config");
    assert_eq!(config, DEFAULT);
}

#[test]
fn full_toml() {
    let config: Configuration = toml::from_str(
        r#"
        print_buffer_limit = 1024
        print_channels = "0x3"
        core_mask = 1
        src_bits = 2
        timestamp_width = 32
        frequency = 100000000
        address_width = { fixed = 32 }
        max_run = 100
        return_stack = 8

        [verbosity]
        source = false

        [source_path]
        strip = "/build"
        replace = "src"
        "#,
    )
    .expect("Could not parse config");
    assert_eq!(
        config,
        Configuration {
            print_buffer_limit: 1024,
            print_channels: Mask(3),
            verbosity: Verbosity {
                address: true,
                instruction: true,
                source: false,
                text: true,
            },
            address_width: AddressWidth::Fixed(32),
            core_mask: Mask(1),
            src_bits: 2,
            timestamp_width: 32,
            frequency: Some(100_000_000),
            max_run: 100,
            return_stack: 8,
            source_path: Some(PathSubstitution {
                strip: "/build".into(),
                replace: "src".into(),
            }),
        }
    );
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn auto_address_width() {
    let config: Configuration =
        toml::from_str(r#"address_width = "auto""#).expect("Could not parse config");
    assert_eq!(config.address_width, AddressWidth::Auto);
}

#[test]
fn mask_formats() {
    #[derive(serde::Deserialize)]
    struct Masks {
        a: Mask,
        b: Mask,
        c: Mask,
        d: Mask,
    }
    let masks: Masks = toml::from_str(
        r#"
        a = 5
        b = "0xFF"
        c = "12"
        d = "all"
        "#,
    )
    .expect("Could not parse masks");
    assert_eq!(masks.a, Mask(5));
    assert_eq!(masks.b, Mask(0xff));
    assert_eq!(masks.c, Mask(12));
    assert_eq!(masks.d, Mask::ALL);
}

#[test]
fn invalid_masks() {
    assert!(toml::from_str::<Configuration>("core_mask = -1").is_err());
    assert!(toml::from_str::<Configuration>(r#"core_mask = "0xzz""#).is_err());
}

#[test]
fn mask_contains() {
    let mask = Mask(0b101);
    assert!(mask.contains(0));
    assert!(!mask.contains(1));
    assert!(mask.contains(2));
    assert!(!mask.contains(64));
    assert!(Mask::ALL.contains(63));
    assert!(Mask::ALL.contains(1000));
}

macro_rules! invalid_test {
    ($name:ident, $field:ident = $value:expr, $err:expr) => {
        #[test]
        fn $name() {
            let config = Configuration {
                $field: $value,
                ..DEFAULT
            };
            assert_eq!(config.validate(), Err($err));
        }
    };
}

invalid_test!(zero_print_buffer, print_buffer_limit = 0, Error::PrintBufferLimit);
invalid_test!(wide_src, src_bits = 17, Error::SrcBits(17));
invalid_test!(zero_timestamp, timestamp_width = 0, Error::TimestampWidth(0));
invalid_test!(wide_timestamp, timestamp_width = 65, Error::TimestampWidth(65));
invalid_test!(
    zero_address,
    address_width = AddressWidth::Fixed(0),
    Error::AddressWidth(0)
);
invalid_test!(zero_frequency, frequency = Some(0), Error::Frequency);
invalid_test!(zero_run, max_run = 0, Error::MaxRun);
invalid_test!(
    deep_return_stack,
    return_stack = MAX_RETURN_STACK + 1,
    Error::ReturnStack(MAX_RETURN_STACK + 1)
);

#[test]
fn path_substitution() {
    let substitution = PathSubstitution {
        strip: "/build/fw".into(),
        replace: "/home/user/fw".into(),
    };
    assert_eq!(
        substitution.apply("/build/fw/src/main.c"),
        PathBuf::from("/home/user/fw/src/main.c")
    );
    assert_eq!(
        substitution.apply("/usr/include/stdio.h"),
        PathBuf::from("/usr/include/stdio.h")
    );
}

#[test]
fn seconds() {
    let config = Configuration {
        frequency: Some(1000),
        ..DEFAULT
    };
    assert_eq!(config.seconds(500), Some(0.5));
    assert_eq!(DEFAULT.seconds(500), None);
}
