//! Customer Information Form Filler
//!
//! Stamps sample customer data onto a blank CIF-1 form.
//!
//! Run with: cargo run -p form-catalog --example fill_form -- <blank.pdf>

use form_catalog::Form;
use form_engine::{render, Background, RenderRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = std::env::args()
        .nth(1)
        .ok_or("usage: fill_form <blank.pdf>")?;
    let pdf_bytes = std::fs::read(&input)?;

    let spec = Form::CustomerInfo.spec()?;
    let background = Background::new(&pdf_bytes, &spec)?;

    let mut request = RenderRequest::new();
    request.set("name", "Ahmad Fariz bin Abdullah");
    request.set("ic_number", "920315-10-5438");
    request.set("birth_date", "15/03/1992");
    request.set("gender", "Lelaki");
    request.set("race", "Bumiputera");
    request.set("home_address", "No 25 Jalan Mawar 3/5 Taman Bunga Raya");
    request.set("home_postcode", "50100");
    request.set("home_city", "Kuala Lumpur");
    request.set("tel_mobile", "0123456789");
    request.set("email", "ahmad.fariz@email.com");

    let filled = render(&spec, &request, background)?;

    std::fs::create_dir_all("output")?;
    let output_path = "output/customer_info_filled.pdf";
    std::fs::write(output_path, filled)?;

    println!("Generated: {output_path}");

    Ok(())
}
