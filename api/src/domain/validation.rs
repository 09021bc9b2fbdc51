//! Imperative validation rules
//!
//! Each entity has a rule list evaluated against the incoming payload.
//! Rules append to a `Violations` accumulator instead of short-circuiting,
//! so one response reports every failed field.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::entities::InvoiceStatus;
use crate::error::Violations;

/// Upper bound on invoice amounts.
pub fn max_invoice_amount() -> Decimal {
    Decimal::from(1_000_000)
}

fn alphabetic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[a-zA-Z]").expect("valid regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\-.]+@([\w-]+\.)+[\w-]{2,}$").expect("valid regex"))
}

/// Name fields require 2-255 characters and at least one letter.
pub fn check_name(violations: &mut Violations, field: &'static str, value: &str) {
    let len = value.chars().count();
    if len < 2 {
        violations.push(field, "must be at least 2 characters");
    } else if len > 255 {
        violations.push(field, "must be at most 255 characters");
    }
    if !alphabetic_re().is_match(value) {
        violations.push(field, "must contain at least one letter");
    }
}

pub fn check_email(violations: &mut Violations, field: &'static str, value: &str) {
    if !email_re().is_match(value) {
        violations.push(field, "is not a valid email address");
    }
}

/// Invoice amounts are strictly positive and capped at 1,000,000.
pub fn check_amount(violations: &mut Violations, amount: Decimal) {
    if amount <= Decimal::ZERO {
        violations.push("amount", "must be strictly positive");
    } else if amount > max_invoice_amount() {
        violations.push("amount", "must be between 0 and 1,000,000");
    }
}

pub fn check_chrono(violations: &mut Violations, chrono: i64) {
    if chrono <= 0 {
        violations.push("chrono", "must be a positive integer");
    }
}

/// The wire format carries the status as a string (type enforcement happens
/// here, not in the deserializer); an unknown value is a field violation.
pub fn parse_status(violations: &mut Violations, raw: &str) -> Option<InvoiceStatus> {
    match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            violations.push("status", "must be SENT, PAID or CANCELLED");
            None
        }
    }
}

/// `sentAt` must be a valid RFC 3339 date/time.
pub fn parse_sent_at(violations: &mut Violations, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            violations.push("sentAt", "must be a valid RFC 3339 date/time");
            None
        }
    }
}
