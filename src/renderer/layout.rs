//! Fixed invoice layout data: page geometry, colors, fonts, strings.
//!
//! Layout data lives here, layout logic lives in the renderer. Nothing in
//! this structure varies per request.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceLayout {
    // A4 in points
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,

    pub company_name: String,
    pub company_address: String,
    pub company_contact: String,
    pub title: String,
    pub footer_text: String,
    /// Currency marker used in the table. The naira sign is outside
    /// WinAnsiEncoding, so the ISO code stands in for it in the PDF.
    pub currency: String,

    pub accent: Rgb,
    pub accent_dark: Rgb,
    pub text: Rgb,
    pub muted: Rgb,
    pub white: Rgb,
    pub panel: Rgb,
    pub grid: Rgb,

    // Table geometry, left to right: product, quantity, price, total.
    pub col_product_width: f32,
    pub col_quantity_width: f32,
    pub col_price_width: f32,
    pub col_total_width: f32,
    pub header_row_height: f32,
    pub row_height: f32,
    pub total_row_height: f32,

    /// Item rows on the first page (heading and metadata above the table).
    pub rows_first_page: usize,
    /// Item rows on each continuation page.
    pub rows_continuation_page: usize,
}

impl Default for InvoiceLayout {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 40.0,

            company_name: "YAROTECH NETWORK LIMITED".to_string(),
            company_address: "No. 122 Lukoro Plaza A, Farm Center, Kano State".to_string(),
            company_contact: "Phone: +234 XXX XXX XXXX | Email: info@yarotech.com.ng".to_string(),
            title: "INVOICE".to_string(),
            footer_text: "Thank you for your business with YAROTECH Network Limited!"
                .to_string(),
            currency: "NGN".to_string(),

            accent: Rgb::new(33, 150, 243),
            accent_dark: Rgb::new(20, 100, 180),
            text: Rgb::new(0, 0, 0),
            muted: Rgb::new(128, 128, 128),
            white: Rgb::new(255, 255, 255),
            panel: Rgb::new(248, 250, 255),
            grid: Rgb::new(200, 200, 200),

            col_product_width: 215.0,
            col_quantity_width: 80.0,
            col_price_width: 100.0,
            col_total_width: 120.0,
            header_row_height: 26.0,
            row_height: 22.0,
            total_row_height: 28.0,

            rows_first_page: 15,
            rows_continuation_page: 24,
        }
    }
}

impl InvoiceLayout {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}
