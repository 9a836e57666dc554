//! Embedded field tables for the supported bank forms
//!
//! Each table is a JSON document compiled into the binary and parsed
//! through [`form_engine::DocumentSpec`], so a bad table fails at load
//! rather than halfway through a render.

use form_engine::{DocumentSpec, SpecError};

const CUSTOMER_INFO: &str = include_str!("../data/customer_info.json");
const PERSONAL_FINANCING: &str = include_str!("../data/personal_financing.json");

/// The forms this catalog knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// CIF-1 customer information form
    CustomerInfo,

    /// Personal financing application form
    PersonalFinancing,
}

impl Form {
    pub const ALL: [Form; 2] = [Form::CustomerInfo, Form::PersonalFinancing];

    /// Catalog key, matching the `name` inside the embedded table
    pub fn name(&self) -> &'static str {
        match self {
            Form::CustomerInfo => "customer-info",
            Form::PersonalFinancing => "personal-financing",
        }
    }

    /// Look a form up by its catalog key
    pub fn by_name(name: &str) -> Option<Form> {
        Form::ALL.iter().copied().find(|f| f.name() == name)
    }

    fn table(&self) -> &'static str {
        match self {
            Form::CustomerInfo => CUSTOMER_INFO,
            Form::PersonalFinancing => PERSONAL_FINANCING,
        }
    }

    /// Parse and validate this form's field table
    pub fn spec(&self) -> Result<DocumentSpec, SpecError> {
        DocumentSpec::from_json(self.table())
    }
}
