//! Canonical taxonomies: closed enumerations persisted as classifier rows.
//!
//! # Responsibility
//! - Declare every closed business enumeration once, with a stable
//!   `(type, value, label, description)` per variant.
//! - Expose one registry table consumed by the seeding routine.
//!
//! # Invariants
//! - Variant order matches `DEFINITIONS` order.
//! - Persisted rows are resolved lazily or seeded; code never assumes ids.

use crate::model::classifier::ClassifierDefinition;
use serde::{Deserialize, Serialize};

/// Closed enumeration backed by classifier rows of one taxonomy.
pub trait ClassifierKind: Copy + Sized + 'static {
    /// Taxonomy name stored in `classifiers.type`.
    const TYPE: &'static str;

    fn all() -> &'static [Self];
    fn definition(self) -> &'static ClassifierDefinition<'static>;

    fn value(self) -> &'static str {
        self.definition().value
    }

    fn label(self) -> &'static str {
        self.definition().label
    }

    fn from_value(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.value() == value)
    }
}

macro_rules! canonical_taxonomy {
    (
        $(#[$meta:meta])*
        $name:ident => $type_name:literal {
            $( $variant:ident => ($value:literal, $label:literal, $description:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $value)] $variant ),+
        }

        impl $name {
            pub const DEFINITIONS: &'static [ClassifierDefinition<'static>] = &[
                $( ClassifierDefinition {
                    classifier_type: $type_name,
                    value: $value,
                    label: $label,
                    description: $description,
                } ),+
            ];
        }

        impl ClassifierKind for $name {
            const TYPE: &'static str = $type_name;

            fn all() -> &'static [Self] {
                &[ $( $name::$variant ),+ ]
            }

            fn definition(self) -> &'static ClassifierDefinition<'static> {
                &Self::DEFINITIONS[self as usize]
            }
        }
    };
}

canonical_taxonomy! {
    /// Lifecycle of a sales proposal.
    ProposalState => "PROPOSAL_STATE" {
        Open => ("OPEN", "Open", "Proposal under negotiation"),
        Approved => ("APPROVED", "Approved", "Approved by credit and management"),
        Rejected => ("REJECTED", "Rejected", "Rejected by credit or management"),
        Canceled => ("CANCELED", "Canceled", "Withdrawn before closing"),
        Closed => ("CLOSED", "Closed", "Sale completed"),
    }
}

canonical_taxonomy! {
    AccountType => "ACCOUNT_TYPE" {
        Checking => ("CORRENTE", "Checking account", ""),
        Savings => ("POUPANCA", "Savings account", ""),
        Payroll => ("SALARIO", "Payroll account", ""),
    }
}

canonical_taxonomy! {
    PersonClassification => "PERSON_CLASSIFICATION" {
        Customer => ("CUSTOMER", "Customer", ""),
        Supplier => ("SUPPLIER", "Supplier", ""),
        Employee => ("EMPLOYEE", "Employee", ""),
        Partner => ("PARTNER", "Business partner", ""),
    }
}

canonical_taxonomy! {
    DocumentType => "DOCUMENT_TYPE" {
        Cpf => ("CPF", "CPF", "Individual taxpayer registry"),
        Cnpj => ("CNPJ", "CNPJ", "Company taxpayer registry"),
        Rg => ("RG", "RG", "Identity card"),
        Passport => ("PASSPORT", "Passport", ""),
    }
}

canonical_taxonomy! {
    PaymentType => "PAYMENT_TYPE" {
        Cash => ("CASH", "Cash", ""),
        Financing => ("FINANCING", "Financing", "Bank or captive financing"),
        Consortium => ("CONSORTIUM", "Consortium", ""),
        Leasing => ("LEASING", "Leasing", ""),
        TradeIn => ("TRADE_IN", "Trade-in", "Used vehicle taken as payment"),
    }
}

canonical_taxonomy! {
    RiskLevel => "RISK_LEVEL" {
        Low => ("LOW", "Low", ""),
        Medium => ("MEDIUM", "Medium", ""),
        High => ("HIGH", "High", ""),
    }
}

canonical_taxonomy! {
    /// Salesperson's estimate that a proposal turns into a sale.
    SaleProbability => "SALE_PROBABILITY" {
        Cold => ("COLD", "Cold", "Unlikely to close"),
        Warm => ("WARM", "Warm", "Could close with follow-up"),
        Hot => ("HOT", "Hot", "Expected to close"),
    }
}

/// Every canonical taxonomy, in seeding order.
pub const CANONICAL_REGISTRY: &[&[ClassifierDefinition<'static>]] = &[
    ProposalState::DEFINITIONS,
    AccountType::DEFINITIONS,
    PersonClassification::DEFINITIONS,
    DocumentType::DEFINITIONS,
    PaymentType::DEFINITIONS,
    RiskLevel::DEFINITIONS,
    SaleProbability::DEFINITIONS,
];

/// Flattened view over [`CANONICAL_REGISTRY`].
pub fn canonical_definitions() -> impl Iterator<Item = &'static ClassifierDefinition<'static>> {
    CANONICAL_REGISTRY.iter().flat_map(|taxonomy| taxonomy.iter())
}
