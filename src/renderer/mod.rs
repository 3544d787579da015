//! Deterministic PDF invoice renderer.
//!
//! Builds the lopdf object graph directly: Helvetica Type1 fonts, one
//! shared resources dictionary, one content stream per page. Given the same
//! sale the output bytes are identical; nothing time- or random-dependent
//! is embedded.

pub mod format;
pub mod layout;

pub use format::{format_amount, format_sale_date, invoice_number};
pub use layout::{InvoiceLayout, Rgb};

use crate::error::AppError;
use crate::models::{SaleDetail, SaleItem};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
        }
    }
}

/// Renders a loaded sale into a fixed-layout, paginated PDF invoice.
pub struct InvoiceRenderer<'a> {
    layout: &'a InvoiceLayout,
}

impl<'a> InvoiceRenderer<'a> {
    pub fn new(layout: &'a InvoiceLayout) -> Self {
        Self { layout }
    }

    /// Render the invoice as PDF bytes.
    pub fn render(&self, sale: &SaleDetail) -> Result<Vec<u8>, AppError> {
        let chunks = self.paginate(&sale.items);
        let page_count = chunks.len();

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let f1 = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let f2 = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => f1,
                "F2" => f2,
            },
        });

        let mut page_ids = Vec::with_capacity(page_count);
        for (page_index, chunk) in chunks.iter().enumerate() {
            let content = self.render_page(sale, chunk, page_index, page_count);
            let encoded = content.encode()?;
            let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), self.layout.page_width.into(), self.layout.page_height.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i32,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Split items into per-page chunks. Capacities are fixed so the total
    /// row and footer always fit below the last chunk.
    fn paginate<'b>(&self, items: &'b [SaleItem]) -> Vec<&'b [SaleItem]> {
        let mut chunks = Vec::new();
        let first = items.len().min(self.layout.rows_first_page);
        chunks.push(&items[..first]);

        let mut rest = &items[first..];
        while !rest.is_empty() {
            let take = rest.len().min(self.layout.rows_continuation_page);
            chunks.push(&rest[..take]);
            rest = &rest[take..];
        }
        chunks
    }

    fn render_page(
        &self,
        sale: &SaleDetail,
        items: &[SaleItem],
        page_index: usize,
        page_count: usize,
    ) -> Content {
        let l = self.layout;
        let mut page = PageBuilder::new(l);

        let table_top = if page_index == 0 {
            self.draw_heading(&mut page);
            self.draw_metadata(&mut page, sale);
            270.0
        } else {
            60.0
        };

        let mut y = table_top;
        self.draw_table_header(&mut page, y);
        y += l.header_row_height;

        for item in items {
            self.draw_item_row(&mut page, y, item);
            y += l.row_height;
        }

        let last_page = page_index + 1 == page_count;
        if last_page {
            self.draw_total_row(&mut page, y, sale.sale.total);
            y += l.total_row_height + 14.0;
            self.draw_footer(&mut page, y);
        }

        page.push_text(
            &format!("Page {} of {}", page_index + 1, page_count),
            Align::Center(l.page_width / 2.0),
            812.0,
            Font::Regular,
            8.0,
            l.muted,
        );

        page.finish()
    }

    fn draw_heading(&self, page: &mut PageBuilder) {
        let l = self.layout;
        let center = l.page_width / 2.0;

        page.push_text(
            &l.company_name,
            Align::Center(center),
            60.0,
            Font::Bold,
            20.0,
            l.accent,
        );
        page.push_text(
            &l.company_address,
            Align::Center(center),
            78.0,
            Font::Regular,
            10.0,
            l.text,
        );
        page.push_text(
            &l.company_contact,
            Align::Center(center),
            92.0,
            Font::Regular,
            10.0,
            l.accent,
        );

        // Double separator line under the heading
        page.push_line(l.margin, 104.0, l.page_width - l.margin, 104.0, 1.0, l.accent);
        page.push_line(l.margin, 107.0, l.page_width - l.margin, 107.0, 0.5, l.accent);

        // Right-aligned INVOICE title on a filled band
        let band_width = 150.0;
        let band_x = l.page_width - l.margin - band_width;
        page.push_rect(band_x, 120.0, band_width, 30.0, l.accent);
        page.push_text(
            &l.title,
            Align::Right(l.page_width - l.margin - 12.0),
            142.0,
            Font::Bold,
            24.0,
            l.white,
        );
    }

    fn draw_metadata(&self, page: &mut PageBuilder, sale: &SaleDetail) {
        let l = self.layout;
        let left = l.margin + 10.0;
        let right = 400.0;

        page.push_rect(l.margin, 165.0, l.content_width(), 85.0, l.panel);

        page.push_text("INVOICE ID", Align::Left(left), 182.0, Font::Bold, 9.0, l.text);
        page.push_text(
            &invoice_number(sale.sale.sale_id),
            Align::Left(left),
            198.0,
            Font::Bold,
            12.0,
            l.accent,
        );

        let customer_name = sale
            .customer
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("N/A");
        page.push_text("BILL TO:", Align::Left(left), 220.0, Font::Bold, 9.0, l.text);
        page.push_text(customer_name, Align::Left(left), 236.0, Font::Bold, 12.0, l.text);

        page.push_text("DATE:", Align::Left(right), 182.0, Font::Bold, 9.0, l.text);
        page.push_text(
            &format_sale_date(sale.sale.sale_date),
            Align::Left(right),
            198.0,
            Font::Regular,
            12.0,
            l.text,
        );

        page.push_text("ISSUED BY:", Align::Left(right), 220.0, Font::Bold, 9.0, l.text);
        page.push_text(
            &sale.sale.issuer_name,
            Align::Left(right),
            236.0,
            Font::Bold,
            12.0,
            l.accent,
        );
    }

    fn draw_table_header(&self, page: &mut PageBuilder, y: f32) {
        let l = self.layout;
        page.push_rect(l.margin, y, l.content_width(), l.header_row_height, l.accent);

        let baseline = y + 17.0;
        let (qty_center, price_right, total_right) = self.column_anchors();

        page.push_text("PRODUCT", Align::Left(l.margin + 8.0), baseline, Font::Bold, 11.0, l.white);
        page.push_text("QUANTITY", Align::Center(qty_center), baseline, Font::Bold, 11.0, l.white);
        page.push_text(
            &format!("PRICE ({})", l.currency),
            Align::Right(price_right),
            baseline,
            Font::Bold,
            11.0,
            l.white,
        );
        page.push_text(
            &format!("TOTAL ({})", l.currency),
            Align::Right(total_right),
            baseline,
            Font::Bold,
            11.0,
            l.white,
        );
    }

    fn draw_item_row(&self, page: &mut PageBuilder, y: f32, item: &SaleItem) {
        let l = self.layout;
        let baseline = y + 15.0;
        let (qty_center, price_right, total_right) = self.column_anchors();

        page.push_text(
            &item.product_name,
            Align::Left(l.margin + 8.0),
            baseline,
            Font::Regular,
            10.0,
            l.text,
        );
        page.push_text(
            &item.quantity.to_string(),
            Align::Center(qty_center),
            baseline,
            Font::Regular,
            10.0,
            l.text,
        );
        page.push_text(
            &format_amount(item.price),
            Align::Right(price_right),
            baseline,
            Font::Regular,
            10.0,
            l.text,
        );
        page.push_text(
            &format_amount(item.total()),
            Align::Right(total_right),
            baseline,
            Font::Bold,
            10.0,
            l.accent,
        );

        page.push_line(
            l.margin,
            y + l.row_height,
            l.page_width - l.margin,
            y + l.row_height,
            0.3,
            l.grid,
        );
    }

    fn draw_total_row(&self, page: &mut PageBuilder, y: f32, total: rust_decimal::Decimal) {
        let l = self.layout;
        let (_, price_right, total_right) = self.column_anchors();
        let total_cell_x = l.margin + l.col_product_width + l.col_quantity_width + l.col_price_width;

        page.push_rect(l.margin, y, l.content_width(), l.total_row_height, l.accent);
        page.push_rect(total_cell_x, y, l.col_total_width, l.total_row_height, l.accent_dark);

        let baseline = y + 18.0;
        page.push_text(
            "GRAND TOTAL",
            Align::Right(price_right),
            baseline,
            Font::Bold,
            12.0,
            l.white,
        );
        page.push_text(
            &format!("{} {}", l.currency, format_amount(total)),
            Align::Right(total_right),
            baseline,
            Font::Bold,
            12.0,
            l.white,
        );
    }

    fn draw_footer(&self, page: &mut PageBuilder, y: f32) {
        let l = self.layout;
        // Inverted coloring: light text on the accent fill
        page.push_rect(l.margin, y, l.content_width(), 26.0, l.accent);
        page.push_text(
            &l.footer_text,
            Align::Center(l.page_width / 2.0),
            y + 17.0,
            Font::Bold,
            11.0,
            l.white,
        );
    }

    /// Anchor x-coordinates: quantity column center, price column right
    /// edge, total column right edge (both inset from the cell border).
    fn column_anchors(&self) -> (f32, f32, f32) {
        let l = self.layout;
        let qty_center = l.margin + l.col_product_width + l.col_quantity_width / 2.0;
        let price_right = l.margin + l.col_product_width + l.col_quantity_width + l.col_price_width - 8.0;
        let total_right = l.page_width - l.margin - 8.0;
        (qty_center, price_right, total_right)
    }
}

enum Align {
    Left(f32),
    Center(f32),
    Right(f32),
}

/// Accumulates content-stream operations for one page. Coordinates are
/// given top-down and flipped to PDF space on emission.
struct PageBuilder<'a> {
    layout: &'a InvoiceLayout,
    content: Content,
}

impl<'a> PageBuilder<'a> {
    fn new(layout: &'a InvoiceLayout) -> Self {
        Self {
            layout,
            content: Content { operations: vec![] },
        }
    }

    fn finish(self) -> Content {
        self.content
    }

    /// Approximate Helvetica advance width. Exact metrics are not needed:
    /// the same input always anchors at the same spot, which is all the
    /// layout asks for.
    fn text_width(text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }

    fn push_text(&mut self, text: &str, align: Align, y_top: f32, font: Font, size: f32, color: Rgb) {
        let x = match align {
            Align::Left(x) => x,
            Align::Center(cx) => cx - Self::text_width(text, size) / 2.0,
            Align::Right(rx) => rx - Self::text_width(text, size),
        };
        let pdf_y = self.layout.page_height - y_top;

        let ops = &mut self.content.operations;
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.name().to_vec()), size.into()],
        ));
        ops.push(Operation::new(
            "rg",
            vec![
                (color.r as f32 / 255.0).into(),
                (color.g as f32 / 255.0).into(),
                (color.b as f32 / 255.0).into(),
            ],
        ));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Td", vec![x.into(), pdf_y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn push_rect(&mut self, x: f32, y_top: f32, width: f32, height: f32, fill: Rgb) {
        let pdf_y = self.layout.page_height - y_top - height;

        let ops = &mut self.content.operations;
        ops.push(Operation::new(
            "rg",
            vec![
                (fill.r as f32 / 255.0).into(),
                (fill.g as f32 / 255.0).into(),
                (fill.b as f32 / 255.0).into(),
            ],
        ));
        ops.push(Operation::new(
            "re",
            vec![x.into(), pdf_y.into(), width.into(), height.into()],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    fn push_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb) {
        let h = self.layout.page_height;

        let ops = &mut self.content.operations;
        ops.push(Operation::new("w", vec![width.into()]));
        ops.push(Operation::new(
            "RG",
            vec![
                (color.r as f32 / 255.0).into(),
                (color.g as f32 / 255.0).into(),
                (color.b as f32 / 255.0).into(),
            ],
        ));
        ops.push(Operation::new("m", vec![x1.into(), (h - y1).into()]));
        ops.push(Operation::new("l", vec![x2.into(), (h - y2).into()]));
        ops.push(Operation::new("S", vec![]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Sale};
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-14T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn fixture_sale(item_count: usize) -> SaleDetail {
        let sale_id = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
        let customer_id = Uuid::parse_str("8c3f1d20-0d6a-4b5e-9a11-92f0c1d24e01").unwrap();

        let items: Vec<SaleItem> = (0..item_count)
            .map(|i| SaleItem {
                sale_item_id: Uuid::from_u128(i as u128 + 1),
                sale_id,
                product_id: None,
                product_name: format!("Dell Latitude 5420 #{}", i + 1),
                quantity: 2,
                price: Decimal::new(35_000_000, 2),
                sort_order: i as i32,
                created_utc: ts(),
            })
            .collect();

        let total = items.iter().fold(Decimal::ZERO, |acc, i| acc + i.total());

        SaleDetail {
            sale: Sale {
                sale_id,
                customer_id: Some(customer_id),
                sale_date: ts(),
                total,
                issuer_name: "Demo Admin".to_string(),
                created_utc: ts(),
            },
            customer: Some(Customer {
                customer_id,
                name: "Acme Ltd".to_string(),
                email: None,
                phone: None,
                address: None,
                created_utc: ts(),
            }),
            items,
        }
    }

    fn render(sale: &SaleDetail) -> Vec<u8> {
        let layout = InvoiceLayout::default();
        InvoiceRenderer::new(&layout).render(sale).unwrap()
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn output_is_a_pdf() {
        let bytes = render(&fixture_sale(3));
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn rendering_the_same_sale_twice_yields_identical_bytes() {
        let sale = fixture_sale(5);
        assert_eq!(render(&sale), render(&sale));
    }

    #[test]
    fn fifteen_items_fit_on_one_page() {
        assert_eq!(page_count(&render(&fixture_sale(15))), 1);
    }

    #[test]
    fn sixteen_items_spill_to_a_second_page() {
        assert_eq!(page_count(&render(&fixture_sale(16))), 2);
    }

    #[test]
    fn continuation_pages_hold_twenty_four_rows() {
        // 15 + 24 on two pages, one more forces a third
        assert_eq!(page_count(&render(&fixture_sale(39))), 2);
        assert_eq!(page_count(&render(&fixture_sale(40))), 3);
    }

    #[test]
    fn empty_sale_still_renders_one_page() {
        let bytes = render(&fixture_sale(0));
        assert_eq!(page_count(&bytes), 1);
        // Total row is drawn even with no items
        assert!(contains(&bytes, "GRAND TOTAL"));
    }

    // Content streams are stored uncompressed, so the invoice text is
    // directly visible in the output bytes.
    #[test]
    fn invoice_text_appears_in_the_output() {
        let bytes = render(&fixture_sale(2));
        assert!(contains(&bytes, "INV-3FA85F64"));
        assert!(contains(&bytes, "Acme Ltd"));
        assert!(contains(&bytes, "May 14, 2024 09:30"));
        assert!(contains(&bytes, "NGN 1,400,000.00"));
        assert!(contains(&bytes, "Page 1 of 1"));
    }

    #[test]
    fn missing_customer_falls_back_to_na() {
        let mut sale = fixture_sale(1);
        sale.customer = None;
        sale.sale.customer_id = None;
        assert!(contains(&render(&sale), "N/A"));
    }
}
