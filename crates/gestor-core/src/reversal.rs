//! # Credit-Note Reversal Planning
//!
//! Decides whether an invoice can be reversed and describes the credit
//! note that reverses it. The database layer executes the plan inside one
//! transaction.
//!
//! ## Reversal Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_reversal(original, items)         (this module, pure)             │
//! │    ├── status ANULADA            → AlreadyVoided                        │
//! │    ├── credit note               → UnsupportedReversal                  │
//! │    ├── fiscal and no CAE         → MissingAuthorization                 │
//! │    └── ReversalPlan { NC type, amounts, lines to copy, stock back }     │
//! │                                                                         │
//! │  InvoiceRepository::reverse(plan)       (gestor-db, one transaction)    │
//! │    ├── number NC (same point of sale)                                   │
//! │    ├── insert NC + copied lines (facturaAnuladaId = original)           │
//! │    ├── authorize NC with AFIP when fiscal                               │
//! │    ├── stock += quantity for each line                                  │
//! │    └── original → ANULADA (guarded, totals untouched)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{Invoice, InvoiceItem};
use crate::voucher::VoucherType;

/// Stock to give back for one line of the original invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRestoration {
    pub product_id: String,
    pub quantity: i64,
}

/// Everything needed to write the credit note.
#[derive(Debug, Clone)]
pub struct ReversalPlan {
    pub original_id: String,
    pub voucher_type: VoucherType,
    pub point_of_sale: i64,
    pub client_id: Option<String>,
    pub branch_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Lines copied verbatim onto the credit note.
    pub items: Vec<InvoiceItem>,
    pub stock_restorations: Vec<StockRestoration>,
}

impl ReversalPlan {
    /// Whether the credit note must obtain a CAE.
    pub fn requires_authorization(&self) -> bool {
        self.voucher_type.is_fiscal()
    }
}

/// Validates `original` and builds the plan for reversing it.
pub fn plan_reversal(original: &Invoice, items: &[InvoiceItem]) -> CoreResult<ReversalPlan> {
    if original.is_voided() {
        return Err(CoreError::AlreadyVoided {
            number: original.number.clone(),
        });
    }

    let voucher_type =
        original
            .voucher_type
            .reversal()
            .ok_or_else(|| CoreError::UnsupportedReversal {
                voucher_type: original.voucher_type.to_string(),
            })?;

    if original.voucher_type.is_fiscal() && original.cae.as_deref().map_or(true, str::is_empty) {
        return Err(CoreError::MissingAuthorization {
            number: original.number.clone(),
        });
    }

    let stock_restorations = items
        .iter()
        .map(|item| StockRestoration {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        })
        .collect();

    Ok(ReversalPlan {
        original_id: original.id.clone(),
        voucher_type,
        point_of_sale: original.point_of_sale,
        client_id: original.client_id.clone(),
        branch_id: original.branch_id.clone(),
        subtotal_cents: original.subtotal_cents,
        tax_cents: original.tax_cents,
        total_cents: original.total_cents,
        items: items.to_vec(),
        stock_restorations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvoiceStatus;
    use chrono::Utc;

    fn invoice(voucher_type: VoucherType, cae: Option<&str>) -> Invoice {
        Invoice {
            id: "orig".into(),
            number: format!("{}-0001", voucher_type.prefix()),
            sequence: 1,
            voucher_type,
            point_of_sale: 2,
            client_id: Some("c1".into()),
            user_id: "u1".into(),
            branch_id: Some("b1".into()),
            issue_date: Utc::now().date_naive(),
            subtotal_cents: 10_000,
            tax_cents: 2_100,
            total_cents: 12_100,
            paid_cents: 12_100,
            status: InvoiceStatus::Pagada,
            cae: cae.map(String::from),
            cae_expires_on: None,
            voided_invoice_id: None,
            reason: None,
            offline_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product_id: &str, quantity: i64) -> InvoiceItem {
        InvoiceItem {
            id: format!("it-{product_id}"),
            invoice_id: "orig".into(),
            product_id: product_id.into(),
            sku_snapshot: product_id.to_uppercase(),
            name_snapshot: product_id.into(),
            quantity,
            unit_price_cents: 1_000,
            tax_rate_bps: 2100,
            subtotal_cents: 1_000 * quantity,
            tax_cents: 210 * quantity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_maps_every_reversible_type() {
        for original in VoucherType::ALL.iter().filter(|v| !v.is_reversal()) {
            let plan = plan_reversal(&invoice(*original, Some("71234567890123")), &[]).unwrap();
            assert_eq!(Some(plan.voucher_type), original.reversal());
            assert_eq!(plan.point_of_sale, 2);
        }
    }

    #[test]
    fn test_plan_copies_amounts_and_stock() {
        let items = vec![item("a", 3), item("b", 1)];
        let plan = plan_reversal(&invoice(VoucherType::FacturaA, Some("1")), &items).unwrap();

        assert_eq!(plan.total_cents, 12_100);
        assert_eq!(plan.items.len(), 2);
        assert_eq!(
            plan.stock_restorations,
            vec![
                StockRestoration { product_id: "a".into(), quantity: 3 },
                StockRestoration { product_id: "b".into(), quantity: 1 },
            ]
        );
        assert!(plan.requires_authorization());
    }

    #[test]
    fn test_already_voided_rejected() {
        let mut inv = invoice(VoucherType::FacturaB, Some("1"));
        inv.status = InvoiceStatus::Anulada;
        assert!(matches!(plan_reversal(&inv, &[]), Err(CoreError::AlreadyVoided { .. })));
    }

    #[test]
    fn test_credit_notes_cannot_be_reversed() {
        let nc = invoice(VoucherType::NotaCreditoA, Some("1"));
        assert!(matches!(
            plan_reversal(&nc, &[]),
            Err(CoreError::UnsupportedReversal { .. })
        ));
    }

    #[test]
    fn test_fiscal_without_cae_rejected_but_remito_allowed() {
        assert!(matches!(
            plan_reversal(&invoice(VoucherType::FacturaC, None), &[]),
            Err(CoreError::MissingAuthorization { .. })
        ));
        assert!(matches!(
            plan_reversal(&invoice(VoucherType::FacturaC, Some("")), &[]),
            Err(CoreError::MissingAuthorization { .. })
        ));

        let plan = plan_reversal(&invoice(VoucherType::Remito, None), &[]).unwrap();
        assert_eq!(plan.voucher_type, VoucherType::NotaCreditoRemito);
        assert!(!plan.requires_authorization());
    }
}
