// Catalogue and membership records
pub mod customers;
pub mod videos;

// Rental bookkeeping
pub mod rental_ledger;
pub mod rentals;

pub use customers::{CustomerInput, CustomerService, VideoRenter};
pub use rental_ledger::{RentalLedger, RentalReceipt};
pub use rentals::RentalService;
pub use videos::{RentedVideo, VideoInput, VideoService};
