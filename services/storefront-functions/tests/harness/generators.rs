// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use serde_json::{json, Value};

/// Generate a pool of client IPs in the 10.x.x.x private range.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = (i >> 16) & 0xFF;
            let b = (i >> 8) & 0xFF;
            let c = i & 0xFF;
            format!("10.{}.{}.{}", a, b, c)
        })
        .collect()
}

/// Generate a pool of sender addresses.
pub fn generate_emails(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("sender-{}@example.com", i))
        .collect()
}

/// A submission that passes every check.
pub fn valid_submission(email: &str) -> Value {
    json!({
        "name": "Ava",
        "email": email,
        "subject": "Hi",
        "message": "1234567890",
        "verificationToken": "tok123",
    })
}

/// Submissions that must fail field validation, with the field at fault.
pub fn invalid_submissions() -> Vec<(&'static str, Value)> {
    let base = valid_submission("ava@example.com");
    let with = |field: &str, value: Value| {
        let mut v = base.clone();
        v[field] = value;
        v
    };

    vec![
        ("name", with("name", json!(""))),
        ("name", with("name", json!("n".repeat(101)))),
        ("email", with("email", json!("not-an-email"))),
        ("email", with("email", json!("ava@localhost"))),
        ("email", with("email", json!("ava smith@example.com"))),
        ("subject", with("subject", json!(""))),
        ("subject", with("subject", json!("s".repeat(201)))),
        ("message", with("message", json!("short"))),
        ("message", with("message", json!("m".repeat(1001)))),
    ]
}

/// Markup an attacker might plant in the operator's inbox.
pub fn injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "\"><svg onload=alert(1)>",
        "<a href='javascript:alert(1)'>click me</a>",
        "<iframe src=https://evil.example></iframe>",
    ]
}

/// Bodies that must be turned away with 400 before anything is sent.
pub fn malformed_bodies() -> Vec<&'static str> {
    vec![
        "",
        "not json",
        "{\"name\": \"Ava\"",
        "[1, 2, 3]",
        "{\"name\": 42}",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(300);
        assert_eq!(ips.len(), 300);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 300);
    }

    #[test]
    fn test_invalid_submissions_differ_from_base() {
        let base = valid_submission("ava@example.com");
        for (_, v) in invalid_submissions() {
            assert_ne!(v, base);
        }
    }
}
