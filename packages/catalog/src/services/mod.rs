//! Query and command services layered on a [`DataGateway`](crate::gateway::DataGateway).

pub mod admin;
pub mod beneficiaries;
pub mod donations;
pub mod donors;
pub mod funds;

pub use admin::{parse_url_list, AdminService, BeneficiaryInput, ReportInput};
pub use beneficiaries::BeneficiaryQueryService;
pub use donations::{
    format_phone, normalize_phone, DonationRequest, DonationService, PaymentMethod,
    PRESET_AMOUNTS,
};
pub use donors::{CategoryDonations, DonationEntry, DonationHistory, DonorService};
pub use funds::{PartnerFundQueryService, HOUSE_FUND};
