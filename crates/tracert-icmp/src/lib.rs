//! ICMP echo probe sender.

mod driver;
mod packet;
pub mod status;

pub use driver::IcmpProbeSender;
