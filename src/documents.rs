//! Source document bundle for one audit request.
//!
//! A [`DocumentBundle`] holds the three structured payloads an external
//! extraction service produces from the patient's paperwork: the clinic
//! bill, the payment program (the insurer's bonification/co-payment
//! breakdown), and the health plan contract. The payloads are opaque to
//! this crate: they are serialized into prompt context and scanned for a
//! handful of well-known fields, never rewritten.

use crate::verify::currency::parse_amount;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The three extracted documents behind one audit, immutable once built.
#[derive(Debug, Clone)]
pub struct DocumentBundle {
    bill: Value,
    payment_program: Value,
    contract: Value,
}

impl DocumentBundle {
    pub fn new(bill: Value, payment_program: Value, contract: Value) -> Self {
        Self {
            bill,
            payment_program,
            contract,
        }
    }

    pub fn bill(&self) -> &Value {
        &self.bill
    }

    pub fn payment_program(&self) -> &Value {
        &self.payment_program
    }

    pub fn contract(&self) -> &Value {
        &self.contract
    }

    /// Pretty-printed bill JSON for prompt interpolation.
    pub fn bill_json(&self) -> String {
        pretty(&self.bill)
    }

    /// Pretty-printed payment-program JSON for prompt interpolation.
    pub fn payment_program_json(&self) -> String {
        pretty(&self.payment_program)
    }

    /// Pretty-printed contract JSON for prompt interpolation.
    pub fn contract_json(&self) -> String {
        pretty(&self.contract)
    }

    /// Content hash over all three payloads, in document order.
    ///
    /// Serialization is compact (non-pretty), so the digest is stable for
    /// a given payload regardless of how the caller formatted the input.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in [&self.bill, &self.payment_program, &self.contract] {
            hasher.update(doc.to_string().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Content hash of the contract payload alone.
    ///
    /// Contracts repeat unchanged across audits for the same patient, so
    /// this is the key used on the memoized path; bills and payment
    /// programs vary run to run and are never cached.
    pub fn contract_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.contract.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Total co-payment the payment program declares, if any.
    ///
    /// Recursively scans the payment-program payload for declared
    /// co-payment totals (`totalCopago` / `total_copago` keys, one per
    /// provider block) and sums them with the locale-aware money parser.
    /// This is the financial ceiling: the audit may never challenge more
    /// than the patient was actually charged.
    pub fn declared_copayment(&self) -> Option<i64> {
        let mut totals = Vec::new();
        collect_copayment_totals(&self.payment_program, &mut totals);
        if totals.is_empty() {
            return None;
        }
        Some(totals.iter().sum())
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn collect_copayment_totals(value: &Value, out: &mut Vec<i64>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if is_copayment_total_key(key) {
                    if let Some(amount) = leaf_amount(child) {
                        out.push(amount);
                        continue;
                    }
                }
                collect_copayment_totals(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_copayment_totals(item, out);
            }
        }
        _ => {}
    }
}

fn is_copayment_total_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    lowered == "totalcopago" || lowered == "total_copago"
}

fn leaf_amount(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => Some(parse_amount(s)),
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.round() as i64)
            .or_else(|| n.as_i64()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle_with_program(program: Value) -> DocumentBundle {
        DocumentBundle::new(json!({"sections": []}), program, json!({"plan": "X"}))
    }

    // =========================================
    // Content hashing
    // =========================================

    #[test]
    fn content_hash_is_deterministic() {
        let a = DocumentBundle::new(json!({"a": 1}), json!([]), json!(null));
        let b = DocumentBundle::new(json!({"a": 1}), json!([]), json!(null));
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn content_hash_changes_with_any_document() {
        let a = DocumentBundle::new(json!({"a": 1}), json!([]), json!(null));
        let b = DocumentBundle::new(json!({"a": 2}), json!([]), json!(null));
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn contract_hash_ignores_bill_and_program() {
        let a = DocumentBundle::new(json!({"a": 1}), json!([1]), json!({"plan": "X"}));
        let b = DocumentBundle::new(json!({"a": 2}), json!([2]), json!({"plan": "X"}));
        assert_eq!(a.contract_hash(), b.contract_hash());
    }

    // =========================================
    // Declared co-payment extraction
    // =========================================

    #[test]
    fn declared_copayment_sums_provider_totals() {
        let bundle = bundle_with_program(json!([
            {"desglosePorPrestador": [
                {"prestador": "Clinic A", "totalCopago": "$1.250.000"},
                {"prestador": "Clinic B", "totalCopago": "$84.500"}
            ]}
        ]));
        assert_eq!(bundle.declared_copayment(), Some(1_334_500));
    }

    #[test]
    fn declared_copayment_accepts_numeric_and_snake_case() {
        let bundle = bundle_with_program(json!({"total_copago": 98500}));
        assert_eq!(bundle.declared_copayment(), Some(98_500));
    }

    #[test]
    fn declared_copayment_missing_is_none() {
        let bundle = bundle_with_program(json!({"items": [{"copago": "$100"}]}));
        assert_eq!(bundle.declared_copayment(), None);
    }
}
