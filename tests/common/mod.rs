//! Shared fixtures: in-memory form PDFs and a PDFium-free rasterizer

#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use pdf_forms_mcp::form::FormDocument;
use pdf_forms_mcp::{Rasterizer, RenderedPage, Result};

pub const FLAG_RADIO: i64 = 0x8000;
pub const FLAG_PUSHBUTTON: i64 = 0x10000;
pub const FLAG_COMBO: i64 = 0x20000;
pub const FLAG_MULTI_SELECT: i64 = 0x200000;

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn rect() -> Object {
    Object::Array(vec![
        Object::Integer(72),
        Object::Integer(600),
        Object::Integer(272),
        Object::Integer(620),
    ])
}

/// Builds a small PDF with an AcroForm, one builder call per field
pub struct FormPdf {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    fields: Vec<Object>,
    widgets: Vec<ObjectId>,
    with_form: bool,
    inline_acroform: bool,
}

impl FormPdf {
    pub fn new(pages: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_ids = (0..pages)
            .map(|_| {
                let contents = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                    "Contents" => contents,
                })
            })
            .collect();

        Self {
            doc,
            pages_id,
            page_ids,
            fields: Vec::new(),
            widgets: Vec::new(),
            with_form: true,
            inline_acroform: false,
        }
    }

    /// A document with pages but no AcroForm at all
    pub fn without_form(pages: usize) -> Self {
        let mut pdf = Self::new(pages);
        pdf.with_form = false;
        pdf
    }

    /// Put the AcroForm dictionary directly in the catalog
    pub fn inline_acroform(mut self) -> Self {
        self.inline_acroform = true;
        self
    }

    fn appearance(&mut self, states: &[&str]) -> Object {
        let mut normal = Dictionary::new();
        for state in states {
            let stream = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 20.into(), 20.into()],
                },
                Vec::new(),
            ));
            normal.set(*state, stream);
        }
        Object::Dictionary(dictionary! { "N" => normal })
    }

    fn widget_dict(&self) -> Dictionary {
        let mut dict = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Rect" => rect(),
        };
        if let Some(page) = self.page_ids.first() {
            dict.set("P", *page);
        }
        dict
    }

    fn add_field(&mut self, dict: Dictionary) -> ObjectId {
        let id = self.doc.add_object(dict);
        self.fields.push(Object::Reference(id));
        id
    }

    /// A merged text field/widget
    pub fn text(mut self, field_name: &str, value: Option<&str>) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Tx"));
        dict.set("T", text(field_name));
        if let Some(value) = value {
            dict.set("V", text(value));
        }
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A text field whose value is stored as UTF-16BE with a BOM
    pub fn utf16_text(mut self, field_name: &str, value: &str) -> Self {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(value.encode_utf16().flat_map(u16::to_be_bytes));
        let mut dict = self.widget_dict();
        dict.set("FT", name("Tx"));
        dict.set("T", text(field_name));
        dict.set("V", Object::String(bytes, StringFormat::Hexadecimal));
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A checkbox with appearances for `on_state` and "Off"
    pub fn checkbox(mut self, field_name: &str, on_state: &str, checked: bool) -> Self {
        let appearance = self.appearance(&[on_state, "Off"]);
        let state = if checked { on_state } else { "Off" };
        let mut dict = self.widget_dict();
        dict.set("FT", name("Btn"));
        dict.set("T", text(field_name));
        dict.set("Ff", 0i64);
        dict.set("V", name(state));
        dict.set("AS", name(state));
        dict.set("AP", appearance);
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A checkbox with no `/V` and no appearance dictionary
    pub fn bare_checkbox(mut self, field_name: &str) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Btn"));
        dict.set("T", text(field_name));
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A radio group with one widget kid per option
    pub fn radio(mut self, field_name: &str, options: &[&str], selected: Option<&str>) -> Self {
        let parent = self.doc.new_object_id();
        let mut kids = Vec::new();
        for option in options {
            let appearance = self.appearance(&[option, "Off"]);
            let state = if selected == Some(*option) { *option } else { "Off" };
            let mut widget = self.widget_dict();
            widget.set("Parent", parent);
            widget.set("AS", name(state));
            widget.set("AP", appearance);
            let id = self.doc.add_object(widget);
            self.widgets.push(id);
            kids.push(Object::Reference(id));
        }

        let mut dict = dictionary! {
            "FT" => "Btn",
            "T" => text(field_name),
            "Ff" => FLAG_RADIO,
            "Kids" => kids,
        };
        if let Some(selected) = selected {
            dict.set("V", name(selected));
        }
        self.doc.objects.insert(parent, Object::Dictionary(dict));
        self.fields.push(Object::Reference(parent));
        self
    }

    /// A choice field with plain string options
    pub fn choice(
        self,
        field_name: &str,
        options: &[&str],
        combo: bool,
        value: Option<&str>,
    ) -> Self {
        let opt: Vec<Object> = options.iter().map(|o| text(o)).collect();
        self.choice_with_opt(field_name, Object::Array(opt), combo, value)
    }

    /// A choice field whose options are `[export display]` pairs
    pub fn choice_pairs(self, field_name: &str, pairs: &[(&str, &str)]) -> Self {
        let opt: Vec<Object> = pairs
            .iter()
            .map(|(export, display)| Object::Array(vec![text(export), text(display)]))
            .collect();
        self.choice_with_opt(field_name, Object::Array(opt), true, None)
    }

    /// A multi-select list box whose `/V` is an array of the `selected` options
    pub fn multi_select(mut self, field_name: &str, options: &[&str], selected: &[&str]) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Ch"));
        dict.set("T", text(field_name));
        dict.set("Ff", FLAG_MULTI_SELECT);
        dict.set(
            "Opt",
            Object::Array(options.iter().map(|o| text(o)).collect()),
        );
        dict.set(
            "V",
            Object::Array(selected.iter().map(|s| text(s)).collect()),
        );
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A choice field whose `/Opt` is not an array
    pub fn malformed_choice(self, field_name: &str) -> Self {
        self.choice_with_opt(field_name, name("Broken"), true, None)
    }

    fn choice_with_opt(
        mut self,
        field_name: &str,
        opt: Object,
        combo: bool,
        value: Option<&str>,
    ) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Ch"));
        dict.set("T", text(field_name));
        dict.set("Ff", if combo { FLAG_COMBO } else { 0 });
        dict.set("Opt", opt);
        if let Some(value) = value {
            dict.set("V", text(value));
        }
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    pub fn signature(mut self, field_name: &str) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Sig"));
        dict.set("T", text(field_name));
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    pub fn push_button(mut self, field_name: &str) -> Self {
        let mut dict = self.widget_dict();
        dict.set("FT", name("Btn"));
        dict.set("T", text(field_name));
        dict.set("Ff", FLAG_PUSHBUTTON);
        let id = self.add_field(dict);
        self.widgets.push(id);
        self
    }

    /// A non-terminal parent `group` holding text fields that inherit its `/FT`
    pub fn text_group(mut self, group: &str, children: &[(&str, &str)]) -> Self {
        let parent = self.doc.new_object_id();
        let mut kids = Vec::new();
        for (child, value) in children {
            let mut dict = self.widget_dict();
            dict.set("Parent", parent);
            dict.set("T", text(child));
            dict.set("V", text(value));
            let id = self.doc.add_object(dict);
            self.widgets.push(id);
            kids.push(Object::Reference(id));
        }
        self.doc.objects.insert(
            parent,
            Object::Dictionary(dictionary! {
                "FT" => "Tx",
                "T" => text(group),
                "Kids" => kids,
            }),
        );
        self.fields.push(Object::Reference(parent));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        if let Some(first) = self.page_ids.first().copied() {
            if !self.widgets.is_empty() {
                let annots: Vec<Object> =
                    self.widgets.iter().map(|id| Object::Reference(*id)).collect();
                if let Ok(Object::Dictionary(page)) = self.doc.get_object_mut(first) {
                    page.set("Annots", annots);
                }
            }
        }

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        if self.with_form {
            let acroform = dictionary! { "Fields" => self.fields };
            if self.inline_acroform {
                catalog.set("AcroForm", acroform);
            } else {
                let id = self.doc.add_object(acroform);
                catalog.set("AcroForm", id);
            }
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        self.doc.save_to(&mut out).expect("serialize test PDF");
        out
    }
}

/// A form exercising every field kind
pub fn sample_form() -> Vec<u8> {
    FormPdf::new(1)
        .text("Full Name Text Box", Some("Jane Doe"))
        .text("Email", None)
        .checkbox("Subscribe Checkbox", "Yes", false)
        .checkbox("Terms", "Agree", true)
        .radio("Plan", &["Basic", "Pro"], Some("Basic"))
        .choice("Country Dropdown", &["Canada", "Mexico"], true, Some("Canada"))
        .choice("Toppings", &["Cheese", "Olives"], false, None)
        .signature("Signature")
        .build()
}

/// Reads a document's field values back through the library
pub fn values_of(pdf: &[u8]) -> std::collections::BTreeMap<String, String> {
    let doc = FormDocument::load(pdf).expect("load PDF");
    pdf_forms_mcp::form::introspect(&doc)
        .expect("introspect")
        .values
}

/// Rasterizer that draws blank pages sized from the DPI, one per page
/// of the document, without needing the PDFium library
pub struct StubRasterizer;

impl StubRasterizer {
    /// Pixel width of a US Letter page at `dpi`
    pub fn width_at(dpi: u32) -> u32 {
        (8.5 * dpi as f32).round() as u32
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<RenderedPage>> {
        let pages = FormDocument::load(pdf)?.page_count();
        let width = Self::width_at(dpi);
        let height = (11.0 * dpi as f32).round() as u32;
        Ok((0..pages)
            .map(|index| {
                let shade = (index * 40 % 255) as u8;
                let image = RgbaImage::from_pixel(width, height, Rgba([shade, 255, 255, 255]));
                RenderedPage::new(index, DynamicImage::ImageRgba8(image))
            })
            .collect())
    }
}
