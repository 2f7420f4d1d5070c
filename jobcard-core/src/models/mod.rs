mod job_card;
mod length_unit;
mod notice;
mod option_item;
mod warranty_status;

pub use job_card::{JobCardRecord, SaveOutcome, SaveStatus, WarrantySnapshot};
pub use length_unit::LengthUnit;
pub use notice::{Notice, Severity};
pub use option_item::OptionItem;
pub use warranty_status::WarrantyStatus;
