//! # Voucher Types
//!
//! The eight document kinds Gestor issues and the fixed table that links
//! each one to its prefix, its credit-note counterpart and its AFIP code.
//!
//! ```text
//! ┌──────────────────────┬────────┬──────────────────────┬───────────┐
//! │ Voucher type         │ Prefix │ Reversed by          │ AFIP code │
//! ├──────────────────────┼────────┼──────────────────────┼───────────┤
//! │ FACTURA_A            │ FA     │ NOTA_CREDITO_A       │ 1         │
//! │ FACTURA_B            │ FB     │ NOTA_CREDITO_B       │ 6         │
//! │ FACTURA_C            │ FC     │ NOTA_CREDITO_C       │ 11        │
//! │ REMITO               │ REM    │ NOTA_CREDITO_REMITO  │ -         │
//! │ NOTA_CREDITO_A       │ NCA    │ -                    │ 3         │
//! │ NOTA_CREDITO_B       │ NCB    │ -                    │ 8         │
//! │ NOTA_CREDITO_C       │ NCC    │ -                    │ 13        │
//! │ NOTA_CREDITO_REMITO  │ NCR    │ -                    │ -         │
//! └──────────────────────┴────────┴──────────────────────┴───────────┘
//! ```
//!
//! Remitos are delivery notes: they are numbered and can be reversed but
//! are never sent to AFIP, so they carry no CAE and no QR.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxCondition;

/// Kind of document issued by the invoicing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum VoucherType {
    FacturaA,
    FacturaB,
    FacturaC,
    Remito,
    NotaCreditoA,
    NotaCreditoB,
    NotaCreditoC,
    NotaCreditoRemito,
}

impl VoucherType {
    /// Every voucher type, in table order.
    pub const ALL: [VoucherType; 8] = [
        VoucherType::FacturaA,
        VoucherType::FacturaB,
        VoucherType::FacturaC,
        VoucherType::Remito,
        VoucherType::NotaCreditoA,
        VoucherType::NotaCreditoB,
        VoucherType::NotaCreditoC,
        VoucherType::NotaCreditoRemito,
    ];

    /// Prefix of the human-readable number (`FA` in `FA-0001`).
    pub const fn prefix(&self) -> &'static str {
        match self {
            VoucherType::FacturaA => "FA",
            VoucherType::FacturaB => "FB",
            VoucherType::FacturaC => "FC",
            VoucherType::Remito => "REM",
            VoucherType::NotaCreditoA => "NCA",
            VoucherType::NotaCreditoB => "NCB",
            VoucherType::NotaCreditoC => "NCC",
            VoucherType::NotaCreditoRemito => "NCR",
        }
    }

    /// The credit-note type that reverses this voucher.
    ///
    /// `None` for credit notes: a reversal cannot itself be reversed.
    pub const fn reversal(&self) -> Option<VoucherType> {
        match self {
            VoucherType::FacturaA => Some(VoucherType::NotaCreditoA),
            VoucherType::FacturaB => Some(VoucherType::NotaCreditoB),
            VoucherType::FacturaC => Some(VoucherType::NotaCreditoC),
            VoucherType::Remito => Some(VoucherType::NotaCreditoRemito),
            _ => None,
        }
    }

    /// AFIP `CbteTipo` code, `None` for non-fiscal documents.
    pub const fn afip_code(&self) -> Option<u16> {
        match self {
            VoucherType::FacturaA => Some(1),
            VoucherType::FacturaB => Some(6),
            VoucherType::FacturaC => Some(11),
            VoucherType::NotaCreditoA => Some(3),
            VoucherType::NotaCreditoB => Some(8),
            VoucherType::NotaCreditoC => Some(13),
            VoucherType::Remito | VoucherType::NotaCreditoRemito => None,
        }
    }

    /// Letter printed in the header box of the PDF.
    pub const fn letter(&self) -> &'static str {
        match self {
            VoucherType::FacturaA | VoucherType::NotaCreditoA => "A",
            VoucherType::FacturaB | VoucherType::NotaCreditoB => "B",
            VoucherType::FacturaC | VoucherType::NotaCreditoC => "C",
            VoucherType::Remito | VoucherType::NotaCreditoRemito => "R",
        }
    }

    /// Document title as printed on paper.
    pub const fn title(&self) -> &'static str {
        match self {
            VoucherType::FacturaA | VoucherType::FacturaB | VoucherType::FacturaC => "FACTURA",
            VoucherType::Remito => "REMITO",
            VoucherType::NotaCreditoRemito => "NOTA DE CREDITO (REMITO)",
            _ => "NOTA DE CREDITO",
        }
    }

    /// Whether the voucher must be authorized by AFIP (has a CAE).
    pub const fn is_fiscal(&self) -> bool {
        self.afip_code().is_some()
    }

    /// Whether this is a credit note.
    pub const fn is_reversal(&self) -> bool {
        matches!(
            self,
            VoucherType::NotaCreditoA
                | VoucherType::NotaCreditoB
                | VoucherType::NotaCreditoC
                | VoucherType::NotaCreditoRemito
        )
    }

    /// Default invoice letter for a client's tax condition.
    ///
    /// Registered taxpayers receive an `A` invoice with discriminated IVA;
    /// everyone else (including walk-in sales) receives a `B`.
    pub fn default_for(condition: Option<TaxCondition>) -> VoucherType {
        match condition {
            Some(TaxCondition::ResponsableInscripto) => VoucherType::FacturaA,
            _ => VoucherType::FacturaB,
        }
    }

    /// Wire name (`FACTURA_A`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            VoucherType::FacturaA => "FACTURA_A",
            VoucherType::FacturaB => "FACTURA_B",
            VoucherType::FacturaC => "FACTURA_C",
            VoucherType::Remito => "REMITO",
            VoucherType::NotaCreditoA => "NOTA_CREDITO_A",
            VoucherType::NotaCreditoB => "NOTA_CREDITO_B",
            VoucherType::NotaCreditoC => "NOTA_CREDITO_C",
            VoucherType::NotaCreditoRemito => "NOTA_CREDITO_REMITO",
        }
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoucherType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "voucher_type".to_string(),
                allowed: VoucherType::ALL.iter().map(|v| v.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
