//! Pre-configured `genpdf::Document` construction shared by the renderers.

use genpdf::error::{Error, ErrorKind};
use genpdf::style;
use genpdf::{self, Element, Margins, Mm, PageDecorator, Position, Size};

use crate::fonts;

/// Converts a plain millimetre value into a `genpdf` length.
pub(crate) fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Builder for `genpdf::Document` instances using the bundled fonts.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
}

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size used for the document.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a footer callback with a fixed height, invoked per page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        let decorator = ConfiguredPageDecorator::new(self.margins, self.footer);
        document.set_page_decorator(decorator);

        Ok(document)
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    /// Creates a new footer specification.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Option<Margins>, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
