use serde::{Deserialize, Serialize};

/// KYC progress flags connector keeps for a Stripe gateway account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StripeAccountSetup {
    #[serde(default)]
    pub bank_account: bool,
    #[serde(default)]
    pub vat_number: bool,
    #[serde(default)]
    pub company_number: bool,
    #[serde(default)]
    pub responsible_person: bool,
    #[serde(default)]
    pub director: bool,
    #[serde(default)]
    pub government_entity_document: bool,
    #[serde(default)]
    pub organisation_details: bool,
}

/// One Stripe onboarding step. Each step is submitted at most once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StripeSetupStep {
    BankAccount,
    VatNumber,
    CompanyNumber,
    ResponsiblePerson,
    Director,
    GovernmentEntityDocument,
    OrganisationDetails,
}

impl StripeSetupStep {
    pub const ALL: [StripeSetupStep; 7] = [
        StripeSetupStep::BankAccount,
        StripeSetupStep::ResponsiblePerson,
        StripeSetupStep::VatNumber,
        StripeSetupStep::CompanyNumber,
        StripeSetupStep::Director,
        StripeSetupStep::GovernmentEntityDocument,
        StripeSetupStep::OrganisationDetails,
    ];

    /// Name of the flag in connector's `stripe-setup` resource.
    pub fn flag_name(&self) -> &'static str {
        match self {
            StripeSetupStep::BankAccount => "bank_account",
            StripeSetupStep::VatNumber => "vat_number",
            StripeSetupStep::CompanyNumber => "company_number",
            StripeSetupStep::ResponsiblePerson => "responsible_person",
            StripeSetupStep::Director => "director",
            StripeSetupStep::GovernmentEntityDocument => "government_entity_document",
            StripeSetupStep::OrganisationDetails => "organisation_details",
        }
    }

    pub fn already_submitted_message(&self) -> &'static str {
        match self {
            StripeSetupStep::BankAccount => "You’ve already provided your bank details.",
            StripeSetupStep::VatNumber => "You’ve already provided your VAT number.",
            StripeSetupStep::CompanyNumber => "You’ve already provided your company registration number.",
            StripeSetupStep::ResponsiblePerson => "You’ve already nominated your responsible person.",
            StripeSetupStep::Director => "You’ve already provided director details.",
            StripeSetupStep::GovernmentEntityDocument => {
                "You’ve already uploaded your government entity document."
            }
            StripeSetupStep::OrganisationDetails => {
                "You’ve already confirmed your organisation details."
            }
        }
    }
}

impl StripeAccountSetup {
    pub fn is_submitted(&self, step: StripeSetupStep) -> bool {
        match step {
            StripeSetupStep::BankAccount => self.bank_account,
            StripeSetupStep::VatNumber => self.vat_number,
            StripeSetupStep::CompanyNumber => self.company_number,
            StripeSetupStep::ResponsiblePerson => self.responsible_person,
            StripeSetupStep::Director => self.director,
            StripeSetupStep::GovernmentEntityDocument => self.government_entity_document,
            StripeSetupStep::OrganisationDetails => self.organisation_details,
        }
    }

    /// The combined "VAT number and company number" step.
    pub fn vat_number_company_number(&self) -> bool {
        self.vat_number && self.company_number
    }

    pub fn all_submitted(&self) -> bool {
        StripeSetupStep::ALL.iter().all(|s| self.is_submitted(*s))
    }
}
