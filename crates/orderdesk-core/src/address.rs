//! # Address Snapshot
//!
//! Copies a customer's address onto an order at creation time.
//!
//! ```text
//! CustomerAddress (Option<String> per field) ──► AddressSnapshot (String)
//!      None ──► ""
//!      web  ──► dropped (orders have no web column)
//! ```
//!
//! The conversion destructures every field of [`CustomerAddress`], so adding
//! an address field without mapping it is a compile error.

use crate::types::{AddressSnapshot, CustomerAddress};

impl From<&CustomerAddress> for AddressSnapshot {
    fn from(address: &CustomerAddress) -> Self {
        let CustomerAddress {
            salutation,
            company,
            name,
            first_name,
            supplement,
            street,
            house_number,
            city,
            postal_code,
            country,
            phone1,
            phone2,
            email,
            web: _,
        } = address;

        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        AddressSnapshot {
            salutation: text(salutation),
            company: text(company),
            name: text(name),
            first_name: text(first_name),
            supplement: text(supplement),
            street: text(street),
            house_number: text(house_number),
            city: text(city),
            postal_code: text(postal_code),
            country: text(country),
            phone1: text(phone1),
            phone2: text(phone2),
            email: text(email),
        }
    }
}
