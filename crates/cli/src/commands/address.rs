//! Address validation command.

use clap::Args;
use koosdoos_core::address::{AddressDraft, AddressField, AddressForm};

use super::{CommandError, print_json};

/// Address fields as flags. Missing flags are validated as empty.
#[derive(Debug, Args)]
pub struct AddressArgs {
    #[arg(long, default_value = "")]
    pub street: String,
    #[arg(long, default_value = "")]
    pub suburb: String,
    #[arg(long, default_value = "")]
    pub city: String,
    #[arg(long, default_value = "")]
    pub province: String,
    #[arg(long, default_value = "")]
    pub postal_code: String,
}

/// Validate the address and print the result.
///
/// # Errors
///
/// Returns [`CommandError::InvalidAddress`] when any field fails, so the
/// exit status reflects validity.
pub fn run(args: AddressArgs, json: bool) -> Result<(), CommandError> {
    let mut form = AddressForm::new(AddressDraft {
        street: args.street,
        suburb: args.suburb,
        city: args.city,
        province: args.province,
        postal_code: args.postal_code,
    });
    form.touch_all();
    let report = form.report();

    if json {
        print_json(&report)?;
    } else if let Some(address) = form.address() {
        println!(
            "Valid: {}, {}, {}, {} {}, {}",
            address.street,
            address.suburb,
            address.city,
            address.province,
            address.postal_code,
            address.country
        );
    } else {
        for field in AddressField::ALL {
            if let Some(message) = report.errors.get(field) {
                println!("  {message}");
            }
        }
    }

    if report.is_valid {
        Ok(())
    } else {
        Err(CommandError::InvalidAddress(report.errors.len()))
    }
}
