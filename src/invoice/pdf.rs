use std::path::Path;

use genpdf::{Alignment, Element, elements, style};

use super::{Invoice, format_yen};
use crate::config::InvoiceConfig;
use crate::error::{Error, Result};

fn pdf_err(e: genpdf::error::Error) -> Error {
    Error::Pdf(e.to_string())
}

/// Loads a logo or stamp. Absent files are skipped; unreadable ones are
/// skipped with a warning so a bad image never blocks an invoice.
fn load_image(path: Option<&Path>) -> Option<elements::Image> {
    let path = path.filter(|p| p.is_file())?;
    let decoded = match image::open(path) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Skipping invoice image {}: {e}", path.display());
            return None;
        }
    };
    // PDF images carry no alpha channel here.
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    match elements::Image::from_dynamic_image(rgb) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("Skipping invoice image {}: {e}", path.display());
            None
        }
    }
}

/// Renders an invoice to PDF bytes with the configured font family.
pub fn render_pdf(invoice: &Invoice, config: &InvoiceConfig) -> Result<Vec<u8>> {
    let font_family = genpdf::fonts::from_files(&config.fonts_dir, &config.font_family, None)
        .map_err(|e| {
            Error::FontsUnavailable(format!(
                "{} in {}: {e}",
                config.font_family,
                config.fonts_dir.display()
            ))
        })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("{} {}", invoice.kind.title(), invoice.recipient));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(15);
    doc.set_page_decorator(decorator);

    if let Some(logo) = load_image(config.logo_path.as_deref()) {
        doc.push(logo);
        doc.push(elements::Break::new(0.5));
    }
    doc.push(
        elements::Paragraph::new(invoice.kind.title())
            .styled(style::Style::new().bold().with_font_size(22)),
    );
    doc.push(elements::Break::new(1));

    let mut issuer = elements::Paragraph::new(invoice.issuer_name.clone());
    issuer.set_alignment(Alignment::Right);
    doc.push(issuer.styled(style::Style::new().with_font_size(10)));
    let mut issued = elements::Paragraph::new(format!(
        "Issued: {}",
        invoice.issued_on.format("%Y/%m/%d")
    ));
    issued.set_alignment(Alignment::Right);
    doc.push(issued.styled(style::Style::new().with_font_size(10)));
    if let Some(stamp) = load_image(config.stamp_path.as_deref()) {
        doc.push(stamp.with_alignment(Alignment::Right));
    }

    doc.push(elements::Break::new(1));
    doc.push(
        elements::Paragraph::new(format!("To: {}", invoice.recipient))
            .styled(style::Style::new().with_font_size(12)),
    );
    if let Some(reg_num) = &invoice.reg_num {
        doc.push(elements::Paragraph::new(format!("Registration No.: {reg_num}")));
    }
    doc.push(elements::Break::new(1.5));

    let mut table = elements::TableLayout::new(vec![5, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Item").styled(bold))
        .element(elements::Paragraph::new("Qty").styled(bold))
        .element(elements::Paragraph::new("Unit price").styled(bold))
        .element(elements::Paragraph::new("Amount").styled(bold))
        .push()
        .map_err(pdf_err)?;

    for line in &invoice.lines {
        table
            .row()
            .element(elements::Paragraph::new(line.item.clone()))
            .element(elements::Paragraph::new(line.qty.to_string()))
            .element(elements::Paragraph::new(format_yen(line.unit_price)))
            .element(elements::Paragraph::new(format_yen(line.line_total)))
            .push()
            .map_err(pdf_err)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(1.5));

    for (label, amount) in [
        ("Subtotal".to_string(), invoice.subtotal),
        (format!("Tax ({}%)", invoice.tax_rate_percent), invoice.tax),
    ] {
        let mut p = elements::Paragraph::new(format!("{label}: {}", format_yen(amount)));
        p.set_alignment(Alignment::Right);
        doc.push(p);
    }
    let mut total = elements::Paragraph::new(format!("Total: {}", format_yen(invoice.total)));
    total.set_alignment(Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(16)));

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_err)?;
    Ok(buffer)
}
