//! End-to-end admission flows: directive block → validate → compile → decide.

use std::net::{IpAddr, Ipv4Addr};

use geogate::{DirectiveError, Filter, FilterConfig, RuleError, StaticResolver};

fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

fn compile(block: &str) -> Filter {
    let config = FilterConfig::from_block(block).expect("parse");
    config.validate().expect("validate");
    Filter::compile(&config).expect("compile")
}

#[test]
fn test_office_allowlist_with_country_fallback() {
    // Admit the office network unconditionally, otherwise only domestic
    // traffic; everything else is blocked.
    let filter = compile(
        "allow_ips 192.168.0.0/16 203.0.113.42\n\
         allow_countries AU\n\
         block_by_default true",
    );

    let resolver = StaticResolver::from_entries([
        (ip(192, 168, 4, 7), "US".to_string()),
        (ip(203, 0, 113, 42), "UNK".to_string()),
        (ip(1, 1, 1, 1), "AU".to_string()),
        (ip(2, 2, 2, 2), "US".to_string()),
    ]);

    // address tier admits regardless of country
    assert!(filter.decide(ip(192, 168, 4, 7), &resolver).allowed);
    assert!(filter.decide(ip(203, 0, 113, 42), &resolver).allowed);
    // country tier
    assert!(filter.decide(ip(1, 1, 1, 1), &resolver).allowed);
    // default deny
    assert!(!filter.decide(ip(2, 2, 2, 2), &resolver).allowed);
}

#[test]
fn test_denylist_with_carveout() {
    // Block an abusive range except one known-good host.
    let filter = compile(
        "deny_ips 203.0.113.0/24\n\
         allow_ips 203.0.113.9",
    );
    let resolver = StaticResolver::new();

    assert!(!filter.decide(ip(203, 0, 113, 5), &resolver).allowed);
    assert!(filter.decide(ip(203, 0, 113, 9), &resolver).allowed);
    assert!(filter.decide(ip(8, 8, 8, 8), &resolver).allowed);
}

#[test]
fn test_country_blocklist() {
    let filter = compile("deny_countries RU CN");

    let resolver = StaticResolver::from_entries([
        (ip(5, 5, 5, 5), "RU".to_string()),
        (ip(6, 6, 6, 6), "CN".to_string()),
        (ip(7, 7, 7, 7), "DE".to_string()),
    ]);

    assert!(!filter.decide(ip(5, 5, 5, 5), &resolver).allowed);
    assert!(!filter.decide(ip(6, 6, 6, 6), &resolver).allowed);
    assert!(filter.decide(ip(7, 7, 7, 7), &resolver).allowed);
    // unresolvable address is not in the deny list, default allows
    assert!(filter.decide(ip(9, 9, 9, 9), &resolver).allowed);
}

#[test]
fn test_verdict_reports_country_even_on_address_match() {
    let filter = compile("deny_ips 203.0.113.0/24");

    let mut resolver = StaticResolver::new();
    resolver.insert(ip(203, 0, 113, 5), "FR");

    let verdict = filter.decide(ip(203, 0, 113, 5), &resolver);
    assert!(!verdict.allowed);
    assert_eq!(verdict.country, "FR");
}

#[test]
fn test_conflicting_block_rejected_before_compile() {
    let config =
        FilterConfig::from_block("allow_countries AU\ndeny_countries US").expect("parse");

    assert_eq!(config.validate(), Err(RuleError::ConflictingCountryRules));
}

#[test]
fn test_sticky_directive_spanning_lines() {
    let config = FilterConfig::from_block(
        "allow_countries AU US\nCA NZ\nblock_by_default true",
    )
    .expect("parse");
    config.validate().expect("validate");

    assert_eq!(
        config.allow_countries.as_deref().unwrap(),
        ["AU", "US", "CA", "NZ"]
    );
    assert_eq!(config.block_by_default, Some(true));
}

#[test]
fn test_bare_token_before_any_directive() {
    assert_eq!(
        FilterConfig::from_block("203.0.113.0/24 deny_ips"),
        Err(DirectiveError::UnexpectedParameter(
            "203.0.113.0/24".to_string()
        ))
    );
}

#[test]
fn test_structured_and_directive_configs_agree() {
    let from_block = FilterConfig::from_block(
        "deny_ips 203.0.113.0/24\nallow_countries AU\nblock_by_default true",
    )
    .expect("parse");

    let from_toml: FilterConfig = toml::from_str(
        r#"
        deny_ips = ["203.0.113.0/24"]
        allow_countries = ["AU"]
        block_by_default = true
        "#,
    )
    .expect("toml");

    assert_eq!(from_block, from_toml);

    let resolver = StaticResolver::from_entries([(ip(1, 1, 1, 1), "AU".to_string())]);
    let a = Filter::compile(&from_block).expect("compile");
    let b = Filter::compile(&from_toml).expect("compile");

    for probe in [ip(203, 0, 113, 8), ip(1, 1, 1, 1), ip(8, 8, 8, 8)] {
        assert_eq!(a.decide(probe, &resolver), b.decide(probe, &resolver));
    }
}
