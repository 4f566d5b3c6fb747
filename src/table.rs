//! Paginated tabular documents (application lists, participant rosters).

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::{style, Alignment, Element as _, PaperSize};

use crate::builder::{mm, DocumentBuilder};
use crate::error::DocumentError;

const PAGE_MARGIN_MM: f64 = 15.0;
const FOOTER_HEIGHT_MM: f64 = 8.0;
const TITLE_FONT_SIZE: u8 = 14;

/// A titled table rendered to an A4 document.
///
/// Cell values are rendered verbatim; any formatting (dates, numbers) is the
/// caller's responsibility.  Pagination is left entirely to the page layout
/// engine, so tables of any length spill over into further pages.
pub struct TableDocument {
    title: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableDocument {
    /// Creates a table document with the given title and no columns yet.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            header: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Sets the header row.  It is always rendered first, in bold.
    pub fn header<I, S>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = header.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a data row and returns the updated document.
    pub fn row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Appends all rows from the iterator and returns the updated document.
    pub fn rows<I, R, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for row in rows {
            self = self.row(row);
        }
        self
    }

    /// Renders the table to PDF bytes.
    pub fn render(self) -> Result<Vec<u8>, DocumentError> {
        if self.header.is_empty() {
            return Err(Error::new(
                "Table document requires at least one header column",
                ErrorKind::InvalidData,
            )
            .into());
        }

        let columns = self.header.len();
        let mut document = DocumentBuilder::new()
            .with_paper_size(PaperSize::A4)
            .with_margins(mm(PAGE_MARGIN_MM))
            .with_footer(mm(FOOTER_HEIGHT_MM), |page| {
                Paragraph::new(format!("{page}")).aligned(Alignment::Center)
            })
            .build()?;

        document.push(
            Paragraph::new(self.title)
                .styled(style::Style::new().bold().with_font_size(TITLE_FONT_SIZE)),
        );
        document.push(Break::new(1));

        let mut table = TableLayout::new(vec![1; columns]);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        push_row(&mut table, columns, self.header, style::Style::new().bold())?;
        for row in self.rows {
            push_row(&mut table, columns, row, style::Style::new())?;
        }

        document.push(table);

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        Ok(bytes)
    }
}

// Rows are padded or truncated to the header width so the layout engine never
// sees a cell-count mismatch.
fn push_row(
    table: &mut TableLayout,
    columns: usize,
    mut cells: Vec<String>,
    style: style::Style,
) -> Result<(), Error> {
    cells.resize(columns, String::new());
    cells.truncate(columns);

    let mut row = table.row();
    for cell in cells {
        row.push_element(Paragraph::new(cell).styled(style).padded(mm(1.0)));
    }
    row.push()
}
