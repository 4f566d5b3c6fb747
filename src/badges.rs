//! Badge sheets: one cut-out card per participant.

use genpdf::elements::{FrameCellDecorator, Image, LinearLayout, Paragraph, TableLayout};
use genpdf::error::Error;
use genpdf::{style, Alignment, Element as _, PaperSize, Scale};
use image::GenericImageView;

use crate::builder::{mm, DocumentBuilder};
use crate::error::DocumentError;
use crate::model::{BadgeOptions, EventRef, Participant};

const PAGE_MARGIN_MM: f64 = 10.0;
const CARD_PADDING_MM: f64 = 4.0;
const LOGO_WIDTH_MM: f64 = 28.0;
const NAME_FONT_SIZE: u8 = 13;
const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const CARDS_PER_ROW: usize = 2;

// Muted colors that stay legible on white card stock.
const ORGANISATION_PALETTE: &[style::Color] = &[
    style::Color::Rgb(178, 34, 34),
    style::Color::Rgb(0, 100, 0),
    style::Color::Rgb(25, 25, 112),
    style::Color::Rgb(184, 134, 11),
    style::Color::Rgb(85, 26, 139),
    style::Color::Rgb(0, 104, 139),
];

/// Stateless renderer for badge sheets.
pub struct BadgeRenderer;

impl BadgeRenderer {
    /// Renders one badge card per participant onto a paginated A4 sheet.
    ///
    /// The caller must pre-filter `participants` to the eligible set; the
    /// renderer is never invoked with an empty list.  An unsupported logo
    /// image fails with [`DocumentError::UnsupportedImage`] before any page
    /// is laid out, so no partial document is ever produced.
    pub fn render(
        event: &EventRef,
        participants: &[Participant],
        options: &BadgeOptions,
    ) -> Result<Vec<u8>, DocumentError> {
        // Decode the logo up front: a bad upload must fail before document
        // construction starts.
        let logo = options
            .logo
            .as_deref()
            .map(image::load_from_memory)
            .transpose()
            .map_err(DocumentError::UnsupportedImage)?;

        let mut document = DocumentBuilder::new()
            .with_paper_size(PaperSize::A4)
            .with_margins(mm(PAGE_MARGIN_MM))
            .build()?;
        document.set_title(format!("Badges - {}", event.name));

        let mut grid = TableLayout::new(vec![1; CARDS_PER_ROW]);
        grid.set_cell_decorator(FrameCellDecorator::new(true, true, true));

        for chunk in participants.chunks(CARDS_PER_ROW) {
            let mut row = grid.row();
            for participant in chunk {
                let card = badge_card(participant, options, logo.as_ref())?;
                row.push_element(card.padded(mm(CARD_PADDING_MM)));
            }
            for _ in chunk.len()..CARDS_PER_ROW {
                row.push_element(Paragraph::new(""));
            }
            row.push()?;
        }

        document.push(grid);

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        Ok(bytes)
    }
}

fn badge_card(
    participant: &Participant,
    options: &BadgeOptions,
    logo: Option<&image::DynamicImage>,
) -> Result<LinearLayout, Error> {
    let mut card = LinearLayout::vertical();

    if let Some(logo) = logo {
        card.push(logo_element(logo)?);
    }

    card.push(
        Paragraph::new(participant.formatted_name(options.name_format))
            .aligned(Alignment::Center)
            .styled(style::Style::new().bold().with_font_size(NAME_FONT_SIZE)),
    );

    if options.show_organisation {
        if let Some(organisation) = participant.organisation.as_deref() {
            let mut line_style = style::Style::new();
            if options.show_color {
                line_style.set_color(organisation_color(organisation));
            }
            card.push(
                Paragraph::new(organisation)
                    .aligned(Alignment::Center)
                    .styled(line_style),
            );
        }
    }

    Ok(card)
}

fn logo_element(logo: &image::DynamicImage) -> Result<Image, Error> {
    let (px_width, _) = logo.dimensions();
    let natural_width_mm = MM_PER_INCH * (px_width as f64) / DEFAULT_IMAGE_DPI;

    let mut element = Image::from_dynamic_image(logo.clone())?;
    element.set_alignment(Alignment::Center);
    if natural_width_mm > f64::EPSILON {
        let scale = LOGO_WIDTH_MM / natural_width_mm;
        element.set_scale(Scale::new(scale, scale));
    }
    Ok(element)
}

// Stable palette pick so the same organisation always gets the same color.
fn organisation_color(organisation: &str) -> style::Color {
    let index = organisation
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_add(byte as usize));
    ORGANISATION_PALETTE[index % ORGANISATION_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::organisation_color;

    #[test]
    fn organisation_color_is_stable() {
        assert_eq!(
            organisation_color("Analytical Engines"),
            organisation_color("Analytical Engines")
        );
    }
}
