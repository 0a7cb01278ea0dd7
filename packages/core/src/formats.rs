//! Builtin named format validators.
//!
//! Seeded into every [`Registry`](crate::Registry): `email`, `url`, `phone`,
//! `idcard`, `ip`, `ipv4`, `ipv6`, `number`, `integer`, `positive`,
//! `positiveInteger`. Address-shaped formats lean on `std::net` parsing;
//! the string-shaped ones use compiled regexes.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use lazy_static::lazy_static;
use regex::Regex;

use crate::registry::Registry;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+$")
            .unwrap();
    static ref URL: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s/$.?#].[^\s]*$").unwrap();
    static ref PHONE: Regex =
        Regex::new(r"^\d{3}-\d{8}$|^\d{4}-\d{7}$|^1[3-9]\d{9}$").unwrap();
    static ref IDCARD: Regex = Regex::new(r"^\d{15}$|^\d{17}[0-9Xx]$").unwrap();
}

/// Install the builtin formats into a registry.
pub(crate) fn install(registry: &mut Registry) {
    registry.register_format("email", |s| EMAIL.is_match(s));
    registry.register_format("url", |s| URL.is_match(s));
    registry.register_format("phone", |s| PHONE.is_match(s));
    registry.register_format("idcard", |s| IDCARD.is_match(s));
    registry.register_format("ip", |s| s.parse::<IpAddr>().is_ok());
    registry.register_format("ipv4", |s| s.parse::<Ipv4Addr>().is_ok());
    registry.register_format("ipv6", |s| s.parse::<Ipv6Addr>().is_ok());
    registry.register_format("number", |s| s.trim().parse::<f64>().is_ok());
    registry.register_format("integer", |s| s.trim().parse::<i64>().is_ok());
    registry.register_format("positive", |s| {
        s.trim().parse::<f64>().map(|n| n > 0.0).unwrap_or(false)
    });
    registry.register_format("positiveInteger", |s| {
        s.trim().parse::<i64>().map(|n| n > 0).unwrap_or(false)
    });
}

#[cfg(test)]
mod tests {
    use crate::registry::Registry;

    fn check(name: &str, input: &str) -> bool {
        let registry = Registry::new();
        registry.format(name).expect("builtin format")(input)
    }

    #[test]
    fn email() {
        assert!(check("email", "a.b@example.com"));
        assert!(!check("email", "not-an-email"));
        assert!(!check("email", "a@b"));
    }

    #[test]
    fn url() {
        assert!(check("url", "https://example.com/x?y=1"));
        assert!(check("url", "ftp://files.example.com"));
        assert!(!check("url", "example.com"));
        assert!(!check("url", "http://has space"));
    }

    #[test]
    fn phone() {
        assert!(check("phone", "13912345678"));
        assert!(check("phone", "010-12345678"));
        assert!(!check("phone", "12345"));
    }

    #[test]
    fn idcard() {
        assert!(check("idcard", "123456789012345"));
        assert!(check("idcard", "12345678901234567X"));
        assert!(!check("idcard", "1234"));
    }

    #[test]
    fn ip_families() {
        assert!(check("ipv4", "192.168.0.1"));
        assert!(!check("ipv4", "256.1.1.1"));
        assert!(check("ipv6", "::1"));
        assert!(!check("ipv6", "192.168.0.1"));
        assert!(check("ip", "192.168.0.1"));
        assert!(check("ip", "fe80::1"));
        assert!(!check("ip", "nope"));
    }

    #[test]
    fn numbers() {
        assert!(check("number", "3.5"));
        assert!(check("number", "-2"));
        assert!(!check("number", "abc"));
        assert!(check("integer", "42"));
        assert!(!check("integer", "4.2"));
        assert!(check("positive", "0.1"));
        assert!(!check("positive", "0"));
        assert!(check("positiveInteger", "3"));
        assert!(!check("positiveInteger", "0"));
        assert!(!check("positiveInteger", "-3"));
    }
}
