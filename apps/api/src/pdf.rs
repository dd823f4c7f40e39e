//! # Voucher PDF
//!
//! Draws invoices, remitos and credit notes on A4 pages.
//!
//! ## Page Layout
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Company name          ┌───┐  FACTURA          │
//! │ CUIT / address        │ A │  FA-0001          │
//! │ IVA condition         └───┘  Fecha 28/03/2024 │
//! ├───────────────────────────────────────────────┤
//! │ Client, CUIT, condition        (first page)   │
//! ├───────────────────────────────────────────────┤
//! │ Cant  Descripcion        P.Unit  IVA  Importe │
//! │ ...   rows_per_page rows per page             │
//! │                     continua en pagina 2 ...  │  (all but last page)
//! ├───────────────────────────────────────────────┤
//! │ ▓▓▓▓  QR           Subtotal / IVA / TOTAL     │  (last page)
//! │ ▓▓▓▓  CAE 7... Vto. CAE 07/04/2024            │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Fiscal vouchers carry the AFIP QR, which encodes
//! `https://www.afip.gob.ar/fe/qr/?p=<base64(json)>`. Remitos have no CAE
//! and render without it.
//!
//! Text uses the builtin Helvetica faces, which are WinAnsi encoded:
//! Spanish accents and `ñ` print as-is, anything outside the code page
//! prints as `?`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
};
use qrcode::{Color, QrCode};
use serde::Serialize;

use crate::config::CompanySettings;
use crate::error::ApiError;
use gestor_core::{Client, InvoiceItem, InvoiceWithItems, Money};

pub const QR_BASE_URL: &str = "https://www.afip.gob.ar/fe/qr/?p=";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 6.0;
const QR_SIZE: f32 = 35.0;

/// Item rows that fit between the tallest client block and the totals.
pub const MAX_ROWS_PER_PAGE: usize = 20;

/// Windows-1252 characters above 0x7F that are not Latin-1.
const WINANSI_EXTRA: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// AFIP document type codes for the receiver.
const DOC_TYPE_CUIT: u16 = 80;
const DOC_TYPE_DNI: u16 = 96;
const DOC_TYPE_NONE: u16 = 99;

// =============================================================================
// QR payload
// =============================================================================

/// JSON encoded in the AFIP QR, field names as AFIP defines them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub ver: u8,
    pub fecha: String,
    pub cuit: u64,
    pub pto_vta: i64,
    pub tipo_cmp: u16,
    pub nro_cmp: i64,
    pub importe: f64,
    pub moneda: String,
    pub ctz: u32,
    pub tipo_doc_rec: u16,
    pub nro_doc_rec: u64,
    pub tipo_cod_aut: String,
    pub cod_aut: u64,
}

/// Builds the QR payload. `None` for vouchers without AFIP code or CAE.
pub fn qr_payload(
    company: &CompanySettings,
    voucher: &InvoiceWithItems,
    client: Option<&Client>,
) -> Result<Option<QrPayload>, ApiError> {
    let invoice = &voucher.invoice;
    let (tipo_cmp, cae) = match (invoice.voucher_type.afip_code(), invoice.cae.as_deref()) {
        (Some(code), Some(cae)) => (code, cae),
        _ => return Ok(None),
    };

    let cuit = parse_digits(&company.cuit)
        .ok_or_else(|| ApiError::Internal(format!("company CUIT is not numeric: {}", company.cuit)))?;
    let cod_aut = parse_digits(cae)
        .ok_or_else(|| ApiError::Internal(format!("CAE is not numeric: {}", cae)))?;

    let (tipo_doc_rec, nro_doc_rec) = receiver_document(client.and_then(|c| c.tax_id.as_deref()));

    Ok(Some(QrPayload {
        ver: 1,
        fecha: invoice.issue_date.format("%Y-%m-%d").to_string(),
        cuit,
        pto_vta: invoice.point_of_sale,
        tipo_cmp,
        nro_cmp: invoice.sequence,
        importe: invoice.total_cents as f64 / 100.0,
        moneda: "PES".to_string(),
        ctz: 1,
        tipo_doc_rec,
        nro_doc_rec,
        tipo_cod_aut: "E".to_string(),
        cod_aut,
    }))
}

/// `https://www.afip.gob.ar/fe/qr/?p=<base64(json)>`
pub fn qr_url(payload: &QrPayload) -> Result<String, ApiError> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| ApiError::Internal(format!("QR payload: {}", e)))?;
    Ok(format!("{}{}", QR_BASE_URL, STANDARD.encode(json)))
}

fn receiver_document(tax_id: Option<&str>) -> (u16, u64) {
    match tax_id.and_then(|id| parse_digits(id).map(|n| (id, n))) {
        Some((id, n)) if id.chars().filter(char::is_ascii_digit).count() == 11 => (DOC_TYPE_CUIT, n),
        Some((_, n)) => (DOC_TYPE_DNI, n),
        None => (DOC_TYPE_NONE, 0),
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// =============================================================================
// Pagination
// =============================================================================

/// Splits the line items into pages. Always at least one page.
pub fn paginate(items: &[InvoiceItem], rows_per_page: usize) -> Vec<&[InvoiceItem]> {
    let rows = rows_per_page.clamp(1, MAX_ROWS_PER_PAGE);
    if items.is_empty() {
        return vec![items];
    }
    items.chunks(rows).collect()
}

// =============================================================================
// Rendering
// =============================================================================

/// Everything printed on a voucher.
pub struct VoucherDocument<'a> {
    pub company: &'a CompanySettings,
    pub voucher: &'a InvoiceWithItems,
    pub client: Option<&'a Client>,
    /// Number of the invoice a credit note reverses.
    pub associated_number: Option<&'a str>,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Renders the voucher as PDF bytes.
pub fn render_voucher(doc: &VoucherDocument<'_>, rows_per_page: usize) -> Result<Vec<u8>, ApiError> {
    let invoice = &doc.voucher.invoice;
    let title = format!("{} {}", invoice.voucher_type.title(), invoice.number);

    let (pdf, first_page, first_layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let fonts = Fonts {
        regular: pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        bold: pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    };

    let qr = match qr_payload(doc.company, doc.voucher, doc.client)? {
        Some(payload) => Some(qr_url(&payload)?),
        None => None,
    };

    let pages = paginate(&doc.voucher.items, rows_per_page);
    let page_count = pages.len();

    for (index, rows) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            pdf.get_page(page).get_layer(layer)
        };

        let mut y = draw_header(&layer, &fonts, doc, index + 1, page_count);
        if index == 0 {
            y = draw_client(&layer, &fonts, doc, y);
        }
        y = draw_items(&layer, &fonts, rows, y);

        if index + 1 < page_count {
            text(&layer, &fonts.regular, &format!("continua en pagina {} ...", index + 2), 9.0, 140.0, y - 4.0);
        } else {
            draw_totals(&layer, &fonts, doc, qr.as_deref())?;
        }
    }

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer)
        .map_err(|e| ApiError::Internal(format!("PDF save failed: {}", e)))?;
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("PDF buffer: {}", e)))
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, s: &str, size: f32, x: f32, y: f32) {
    layer.use_text(winansi(s), size, Mm(x), Mm(y), font);
}

/// Replaces characters the builtin fonts cannot encode.
fn winansi(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c,
            c if WINANSI_EXTRA.contains(c) => c,
            _ => '?',
        })
        .collect()
}

fn rule(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn outline(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y + h)), false),
            (Point::new(Mm(x), Mm(y + h)), false),
        ],
        is_closed: true,
    });
}

fn filled_square(layer: &PdfLayerReference, x: f32, y: f32, size: f32) {
    layer.add_polygon(Polygon {
        rings: vec![vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + size), Mm(y)), false),
            (Point::new(Mm(x + size), Mm(y + size)), false),
            (Point::new(Mm(x), Mm(y + size)), false),
        ]],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

/// Returns the y position below the header.
fn draw_header(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    doc: &VoucherDocument<'_>,
    page: usize,
    page_count: usize,
) -> f32 {
    let invoice = &doc.voucher.invoice;
    let company = doc.company;

    text(layer, &fonts.bold, &company.name, 15.0, MARGIN, 282.0);
    text(layer, &fonts.regular, &format!("CUIT: {}", company.cuit), 9.0, MARGIN, 276.0);
    text(layer, &fonts.regular, &company.address, 9.0, MARGIN, 271.5);
    text(layer, &fonts.regular, company.tax_condition.label(), 9.0, MARGIN, 267.0);

    // Letter box
    outline(layer, 98.0, 266.0, 14.0, 14.0);
    text(layer, &fonts.bold, invoice.voucher_type.letter(), 20.0, 102.0, 269.5);
    if let Some(code) = invoice.voucher_type.afip_code() {
        text(layer, &fonts.regular, &format!("COD. {:02}", code), 6.0, 99.5, 263.0);
    }

    text(layer, &fonts.bold, invoice.voucher_type.title(), 13.0, 125.0, 282.0);
    text(layer, &fonts.bold, &format!("Nro. {:04}-{}", invoice.point_of_sale, invoice.number), 11.0, 125.0, 276.0);
    text(
        layer,
        &fonts.regular,
        &format!("Fecha: {}", invoice.issue_date.format("%d/%m/%Y")),
        9.0,
        125.0,
        271.5,
    );
    text(layer, &fonts.regular, &format!("Pagina {} de {}", page, page_count), 8.0, 125.0, 267.0);

    rule(layer, 260.0);
    255.0
}

fn draw_client(layer: &PdfLayerReference, fonts: &Fonts, doc: &VoucherDocument<'_>, y: f32) -> f32 {
    let mut y = y;
    match doc.client {
        Some(client) => {
            text(layer, &fonts.bold, &format!("Cliente: {}", client.name), 10.0, MARGIN, y);
            y -= 5.0;
            let tax_id = client.tax_id.as_deref().unwrap_or("-");
            text(
                layer,
                &fonts.regular,
                &format!("CUIT/DNI: {}   {}", tax_id, client.tax_condition.label()),
                9.0,
                MARGIN,
                y,
            );
            if let Some(address) = &client.address {
                y -= 5.0;
                text(layer, &fonts.regular, &format!("Domicilio: {}", address), 9.0, MARGIN, y);
            }
        }
        None => {
            text(layer, &fonts.bold, "Cliente: Consumidor Final", 10.0, MARGIN, y);
        }
    }

    if let Some(number) = doc.associated_number {
        y -= 5.0;
        text(layer, &fonts.regular, &format!("Comprobante asociado: {}", number), 9.0, MARGIN, y);
    }
    if let Some(reason) = &doc.voucher.invoice.reason {
        y -= 5.0;
        text(layer, &fonts.regular, &format!("Motivo: {}", reason), 9.0, MARGIN, y);
    }

    y -= 4.0;
    rule(layer, y);
    y - 7.0
}

fn draw_items(layer: &PdfLayerReference, fonts: &Fonts, rows: &[InvoiceItem], y: f32) -> f32 {
    let mut y = y;
    text(layer, &fonts.bold, "Cant.", 9.0, MARGIN, y);
    text(layer, &fonts.bold, "Descripcion", 9.0, 30.0, y);
    text(layer, &fonts.bold, "P. Unit.", 9.0, 120.0, y);
    text(layer, &fonts.bold, "IVA", 9.0, 148.0, y);
    text(layer, &fonts.bold, "Importe", 9.0, 170.0, y);
    y -= 2.5;
    rule(layer, y);
    y -= ROW_HEIGHT;

    for item in rows {
        text(layer, &fonts.regular, &item.quantity.to_string(), 9.0, MARGIN, y);
        text(layer, &fonts.regular, &truncate(&item.name_snapshot, 48), 9.0, 30.0, y);
        text(
            layer,
            &fonts.regular,
            &Money::from_cents(item.unit_price_cents).to_string(),
            9.0,
            120.0,
            y,
        );
        text(
            layer,
            &fonts.regular,
            &format!("{}%", gestor_core::TaxRate::from_bps(item.tax_rate_bps).percentage()),
            9.0,
            148.0,
            y,
        );
        text(layer, &fonts.regular, &item.total().to_string(), 9.0, 170.0, y);
        y -= ROW_HEIGHT;
    }

    rule(layer, y + ROW_HEIGHT - 2.0);
    y
}

fn draw_totals(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    doc: &VoucherDocument<'_>,
    qr: Option<&str>,
) -> Result<(), ApiError> {
    let invoice = &doc.voucher.invoice;

    text(layer, &fonts.regular, "Subtotal:", 10.0, 140.0, 50.0);
    text(layer, &fonts.regular, &Money::from_cents(invoice.subtotal_cents).to_string(), 10.0, 170.0, 50.0);
    text(layer, &fonts.regular, "IVA:", 10.0, 140.0, 44.0);
    text(layer, &fonts.regular, &Money::from_cents(invoice.tax_cents).to_string(), 10.0, 170.0, 44.0);
    text(layer, &fonts.bold, "TOTAL:", 12.0, 140.0, 36.0);
    text(layer, &fonts.bold, &invoice.total().to_string(), 12.0, 170.0, 36.0);

    if let Some(url) = qr {
        draw_qr(layer, url, MARGIN, 15.0)?;
    }

    match (&invoice.cae, invoice.cae_expires_on) {
        (Some(cae), Some(expires_on)) => {
            text(layer, &fonts.bold, &format!("CAE: {}", cae), 10.0, 60.0, 24.0);
            text(
                layer,
                &fonts.regular,
                &format!("Vto. CAE: {}", expires_on.format("%d/%m/%Y")),
                10.0,
                60.0,
                18.0,
            );
        }
        _ => {
            text(layer, &fonts.regular, "Documento no valido como factura", 9.0, MARGIN, 18.0);
        }
    }
    Ok(())
}

/// Draws the QR with its lower-left corner at (x, y).
fn draw_qr(layer: &PdfLayerReference, url: &str, x: f32, y: f32) -> Result<(), ApiError> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| ApiError::Internal(format!("QR encode failed: {}", e)))?;
    let width = code.width();
    let module = QR_SIZE / width as f32;
    let colors = code.to_colors();

    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let col = (i % width) as f32;
        let row = (i / width) as f32;
        // Row 0 is the top of the symbol.
        filled_square(layer, x + col * module, y + QR_SIZE - (row + 1.0) * module, module);
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use gestor_core::{Invoice, InvoiceStatus, TaxCondition, VoucherType};

    fn company() -> CompanySettings {
        CompanySettings::default()
    }

    fn item(n: usize) -> InvoiceItem {
        InvoiceItem {
            id: format!("i{}", n),
            invoice_id: "inv".into(),
            product_id: "p".into(),
            sku_snapshot: format!("SKU-{}", n),
            name_snapshot: format!("Producto {}", n),
            quantity: 2,
            unit_price_cents: 10_000,
            tax_rate_bps: 2100,
            subtotal_cents: 20_000,
            tax_cents: 4_200,
            created_at: Utc::now(),
        }
    }

    fn voucher(voucher_type: VoucherType, items: usize, cae: Option<&str>) -> InvoiceWithItems {
        let items: Vec<InvoiceItem> = (0..items).map(item).collect();
        let subtotal: i64 = items.iter().map(|i| i.subtotal_cents).sum();
        let tax: i64 = items.iter().map(|i| i.tax_cents).sum();
        InvoiceWithItems {
            invoice: Invoice {
                id: "inv".into(),
                number: format!("{}-0007", voucher_type.prefix()),
                sequence: 7,
                voucher_type,
                point_of_sale: 3,
                client_id: Some("c".into()),
                user_id: "u".into(),
                branch_id: None,
                issue_date: NaiveDate::from_ymd_opt(2024, 3, 28).unwrap(),
                subtotal_cents: subtotal,
                tax_cents: tax,
                total_cents: subtotal + tax,
                paid_cents: 0,
                status: InvoiceStatus::Pendiente,
                cae: cae.map(str::to_string),
                cae_expires_on: cae.map(|_| NaiveDate::from_ymd_opt(2024, 4, 7).unwrap()),
                voided_invoice_id: None,
                reason: None,
                offline_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items,
        }
    }

    fn client(tax_id: Option<&str>) -> Client {
        Client {
            id: "c".into(),
            name: "Distribuidora del Sur SA".into(),
            tax_id: tax_id.map(str::to_string),
            tax_condition: TaxCondition::ResponsableInscripto,
            address: Some("Calle 1".into()),
            email: None,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_qr_payload_fields() {
        let v = voucher(VoucherType::FacturaA, 1, Some("74123456789012"));
        let c = client(Some("30712345671"));
        let payload = qr_payload(&company(), &v, Some(&c)).unwrap().unwrap();

        assert_eq!(payload.ver, 1);
        assert_eq!(payload.fecha, "2024-03-28");
        assert_eq!(payload.cuit, 30712345671);
        assert_eq!(payload.pto_vta, 3);
        assert_eq!(payload.tipo_cmp, 1);
        assert_eq!(payload.nro_cmp, 7);
        assert_eq!(payload.importe, 242.0);
        assert_eq!(payload.moneda, "PES");
        assert_eq!(payload.tipo_doc_rec, 80);
        assert_eq!(payload.nro_doc_rec, 30712345671);
        assert_eq!(payload.tipo_cod_aut, "E");
        assert_eq!(payload.cod_aut, 74123456789012);
    }

    #[test]
    fn test_qr_url_decodes_to_afip_keys() {
        let v = voucher(VoucherType::FacturaB, 1, Some("74123456789012"));
        let payload = qr_payload(&company(), &v, None).unwrap().unwrap();
        assert_eq!(payload.tipo_doc_rec, 99);
        assert_eq!(payload.nro_doc_rec, 0);

        let url = qr_url(&payload).unwrap();
        let encoded = url.strip_prefix(QR_BASE_URL).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();

        for key in [
            "ver", "fecha", "cuit", "ptoVta", "tipoCmp", "nroCmp", "importe", "moneda", "ctz",
            "tipoDocRec", "nroDocRec", "tipoCodAut", "codAut",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["tipoCmp"], 6);
    }

    #[test]
    fn test_dni_receiver() {
        let v = voucher(VoucherType::FacturaB, 1, Some("74123456789012"));
        let c = client(Some("30123456"));
        let payload = qr_payload(&company(), &v, Some(&c)).unwrap().unwrap();
        assert_eq!(payload.tipo_doc_rec, 96);
        assert_eq!(payload.nro_doc_rec, 30123456);
    }

    #[test]
    fn test_remito_has_no_qr() {
        let v = voucher(VoucherType::Remito, 1, None);
        assert!(qr_payload(&company(), &v, None).unwrap().is_none());

        // A fiscal voucher without CAE has none either.
        let v = voucher(VoucherType::FacturaB, 1, None);
        assert!(qr_payload(&company(), &v, None).unwrap().is_none());
    }

    #[test]
    fn test_paginate() {
        let v = voucher(VoucherType::FacturaB, 45, None);
        let pages = paginate(&v.items, 20);
        assert_eq!(pages.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![20, 20, 5]);

        assert_eq!(paginate(&v.items[..20], 20).len(), 1);
        assert_eq!(paginate(&[], 20).len(), 1);

        // Larger pages would run into the totals block.
        let pages = paginate(&v.items, 100);
        assert_eq!(pages.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![20, 20, 5]);
    }

    #[test]
    fn test_render_produces_pdf() {
        let c = client(Some("30712345671"));
        let v = voucher(VoucherType::FacturaA, 25, Some("74123456789012"));
        let doc = VoucherDocument {
            company: &company(),
            voucher: &v,
            client: Some(&c),
            associated_number: None,
        };
        let bytes = render_voucher(&doc, 20).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let remito = voucher(VoucherType::Remito, 3, None);
        let doc = VoucherDocument {
            company: &company(),
            voucher: &remito,
            client: None,
            associated_number: None,
        };
        assert!(render_voucher(&doc, 20).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_spanish_names_render() {
        let mut c = client(Some("20301234567"));
        c.name = "Muñoz Hnos. - Almacén Ñandú".into();
        c.address = Some("Güemes 1234, Córdoba".into());
        let mut v = voucher(VoucherType::FacturaA, 2, Some("74123456789012"));
        v.items[0].name_snapshot = "Jamón crudo 200g".into();
        v.items[1].name_snapshot = "Mate 🧉 calabaza".into();
        let doc = VoucherDocument {
            company: &company(),
            voucher: &v,
            client: Some(&c),
            associated_number: None,
        };

        assert!(render_voucher(&doc, 20).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_winansi_keeps_spanish_text() {
        assert_eq!(winansi("Muñoz, Jamón, Güemes, ¿Señal?"), "Muñoz, Jamón, Güemes, ¿Señal?");
        assert_eq!(winansi("“Mate” – 1€"), "“Mate” – 1€");
        assert_eq!(winansi("Mate 🧉 / 中"), "Mate ? / ?");
        assert_eq!(winansi("a\tb"), "a?b");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Yerba", 48), "Yerba");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
