//! Schema validation for [`ProductDraft`]s.
//!
//! Validation runs over every field at once and reports at most one
//! violation per field (the first rule that fails), so the form can show
//! an inline message next to each invalid control.

use std::fmt;

use tracing::debug;

use super::catalog::{Category, Color, Size};
use super::form::ProductDraft;
use super::product::NewProduct;

pub const SHORT_DESCRIPTION_MAX: usize = 60;

/// Fields of the product schema, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    ShortDescription,
    Description,
    Price,
    Category,
    Sizes,
    Colors,
    Images,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::ShortDescription => "Short Description",
            Field::Description => "Description",
            Field::Price => "Price",
            Field::Category => "Category",
            Field::Sizes => "Sizes",
            Field::Colors => "Colors",
            Field::Images => "Images",
        }
    }

    /// Schema key, as used in submitted records.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::ShortDescription => "shortDescription",
            Field::Description => "description",
            Field::Price => "price",
            Field::Category => "category",
            Field::Sizes => "sizes",
            Field::Colors => "colors",
            Field::Images => "images",
        }
    }
}

/// Which constraint a field violated.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Required,
    TooLong { max: usize, len: usize },
    NotANumber { input: String },
    NotPositive { value: f64 },
    OutsideEnum { token: String },
    MissingImage { color: Color },
    ImageWithoutColor { color: Color },
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}: {message}", .field.key())]
pub struct FieldError {
    pub field: Field,
    pub violation: Violation,
    pub message: String,
}

impl FieldError {
    /// Build an error with the default message for `violation`.
    pub fn new(field: Field, violation: Violation) -> Self {
        let message = default_message(field, &violation);
        Self {
            field,
            violation,
            message,
        }
    }
}

fn default_message(field: Field, violation: &Violation) -> String {
    match (field, violation) {
        (Field::Name, Violation::Required) => "Product name is required!".into(),
        (Field::ShortDescription, Violation::Required) => "Short description is required!".into(),
        (Field::Description, Violation::Required) => "Description is required!".into(),
        (Field::Price, Violation::Required) => "Price is required!".into(),
        (Field::Category, Violation::Required) => "Category is required!".into(),
        (_, Violation::Required) => format!("{} is required!", field.label()),
        (_, Violation::TooLong { max, len }) => {
            format!("Must contain at most {max} characters ({len} entered)")
        }
        (_, Violation::NotANumber { input }) => format!("`{input}` is not a number"),
        (_, Violation::NotPositive { .. }) => "Price must be greater than 0".into(),
        (Field::Category, Violation::OutsideEnum { token }) => {
            invalid_option(token, Category::ALL.iter().map(|c| c.as_str()))
        }
        (Field::Sizes, Violation::OutsideEnum { token }) => {
            invalid_option(token, Size::ALL.iter().map(|s| s.as_str()))
        }
        (Field::Colors | Field::Images, Violation::OutsideEnum { token }) => {
            invalid_option(token, Color::ALL.iter().map(|c| c.as_str()))
        }
        (_, Violation::OutsideEnum { token }) => format!("Invalid option `{token}`"),
        (_, Violation::MissingImage { color }) => format!("Upload an image for {color}"),
        (_, Violation::ImageWithoutColor { color }) => {
            format!("Select {color} before uploading its image")
        }
    }
}

fn invalid_option<'a>(token: &str, options: impl Iterator<Item = &'a str>) -> String {
    let options: Vec<&str> = options.collect();
    format!("Invalid option `{token}`; expected one of {}", options.join(", "))
}

/// Every failing field from one validation run, in form order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// The first invalid field, for moving focus after a failed submit.
    pub fn first_field(&self) -> Option<Field> {
        self.0.first().map(|e| e.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.key()).collect();
        write!(f, "{} invalid field(s): {}", self.0.len(), fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Whether every selected color must have an uploaded image before submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageCoverage {
    /// Upload slots may stay empty.
    #[default]
    Optional,
    /// Every selected color needs an image.
    Strict,
}

impl ImageCoverage {
    pub const ALL: &[ImageCoverage] = &[ImageCoverage::Optional, ImageCoverage::Strict];

    pub fn label(self) -> &'static str {
        match self {
            ImageCoverage::Optional => "optional",
            ImageCoverage::Strict => "strict",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "optional" => Some(ImageCoverage::Optional),
            "strict" => Some(ImageCoverage::Strict),
            _ => None,
        }
    }
}

/// The product schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSchema {
    pub image_coverage: ImageCoverage,
}

impl ProductSchema {
    pub fn new(image_coverage: ImageCoverage) -> Self {
        Self { image_coverage }
    }

    /// Validate the whole draft.  Never panics; every failure is returned
    /// as a field-scoped error.
    pub fn validate(&self, draft: &ProductDraft) -> Result<NewProduct, ValidationErrors> {
        let mut errors = Vec::new();

        let name = required(Field::Name, draft.name(), &mut errors);
        let short_description =
            required(Field::ShortDescription, draft.short_description(), &mut errors).and_then(
                |s| {
                    let len = s.chars().count();
                    if len > SHORT_DESCRIPTION_MAX {
                        errors.push(FieldError::new(
                            Field::ShortDescription,
                            Violation::TooLong {
                                max: SHORT_DESCRIPTION_MAX,
                                len,
                            },
                        ));
                        None
                    } else {
                        Some(s)
                    }
                },
            );
        let description = required(Field::Description, draft.description(), &mut errors);
        let price = parse_price(draft.price(), &mut errors);
        let category = parse_category(draft.category(), &mut errors);

        if self.image_coverage == ImageCoverage::Strict {
            if let Some(color) = draft.colors().iter().find(|c| !draft.images().contains_key(*c)) {
                errors.push(FieldError::new(
                    Field::Images,
                    Violation::MissingImage { color: *color },
                ));
            }
        }

        if !errors.is_empty() {
            errors.sort_by_key(|e| e.field);
            debug!(count = errors.len(), "draft failed validation");
            return Err(ValidationErrors(errors));
        }

        match (name, short_description, description, price, category) {
            (Some(name), Some(short_description), Some(description), Some(price), Some(category)) => {
                Ok(NewProduct {
                    name,
                    short_description,
                    description,
                    price,
                    category,
                    sizes: draft.sizes().iter().copied().collect(),
                    colors: draft.colors().iter().copied().collect(),
                    images: draft.images().clone(),
                })
            }
            // Every `None` above pushed an error, so this arm is never taken.
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn required(field: Field, value: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, Violation::Required));
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_price(input: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        errors.push(FieldError::new(Field::Price, Violation::Required));
        return None;
    }
    let value = match input.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            errors.push(FieldError::new(
                Field::Price,
                Violation::NotANumber {
                    input: input.to_string(),
                },
            ));
            return None;
        }
    };
    if value <= 0.0 {
        errors.push(FieldError::new(Field::Price, Violation::NotPositive { value }));
        return None;
    }
    Some(value)
}

fn parse_category(token: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Category> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        errors.push(FieldError::new(Field::Category, Violation::Required));
        return None;
    };
    match Category::parse(token) {
        Ok(c) => Some(c),
        Err(_) => {
            errors.push(FieldError::new(
                Field::Category,
                Violation::OutsideEnum {
                    token: token.to_string(),
                },
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::form::FormAction;
    use crate::core::image::ImageRef;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn blue_image() -> ImageRef {
        ImageRef {
            path: PathBuf::from("blue.png"),
            mime: "image/png".into(),
            width: 10,
            height: 10,
        }
    }

    fn valid_draft() -> ProductDraft {
        let mut d = ProductDraft::new();
        for action in [
            FormAction::SetName("Runner".into()),
            FormAction::SetShortDescription("Light running shoe".into()),
            FormAction::SetDescription("A light shoe for long runs.".into()),
            FormAction::SetPrice("10".into()),
            FormAction::SetCategory("Shoes".into()),
            FormAction::SetSize { size: Size::M, checked: true },
            FormAction::SetColor { color: Color::Blue, checked: true },
            FormAction::AttachImage { color: Color::Blue, image: blue_image() },
        ] {
            d.apply(action).unwrap();
        }
        d
    }

    #[test]
    fn fully_valid_draft_passes() {
        let product = ProductSchema::default().validate(&valid_draft()).expect("valid");
        assert_eq!(product.price, 10.0);
        assert_eq!(product.category, Category::Shoes);
        assert_eq!(product.sizes, vec![Size::M]);
        assert_eq!(product.colors, vec![Color::Blue]);
        assert_eq!(product.images.get(&Color::Blue), Some(&blue_image()));

        let strict = ProductSchema::new(ImageCoverage::Strict);
        assert!(strict.validate(&valid_draft()).is_ok());
    }

    #[test]
    fn empty_name_reports_required_on_name_only() {
        let mut d = valid_draft();
        d.apply(FormAction::SetName(String::new())).unwrap();
        let errs = ProductSchema::default().validate(&d).unwrap_err();
        assert_eq!(errs.len(), 1);
        let e = errs.get(Field::Name).expect("name error");
        assert_eq!(e.violation, Violation::Required);
        assert_eq!(e.message, "Product name is required!");
    }

    #[test]
    fn short_description_of_61_chars_is_too_long() {
        let mut d = valid_draft();
        d.apply(FormAction::SetShortDescription("x".repeat(61))).unwrap();
        let errs = ProductSchema::default().validate(&d).unwrap_err();
        assert_eq!(
            errs.get(Field::ShortDescription).map(|e| &e.violation),
            Some(&Violation::TooLong { max: 60, len: 61 })
        );

        d.apply(FormAction::SetShortDescription("é".repeat(60))).unwrap();
        assert!(ProductSchema::default().validate(&d).is_ok());
    }

    #[test]
    fn price_must_be_a_positive_number() {
        let schema = ProductSchema::default();
        let cases = [
            ("", Violation::Required),
            ("abc", Violation::NotANumber { input: "abc".into() }),
            ("inf", Violation::NotANumber { input: "inf".into() }),
            ("0", Violation::NotPositive { value: 0.0 }),
            ("-3.5", Violation::NotPositive { value: -3.5 }),
        ];
        for (input, expected) in cases {
            let mut d = valid_draft();
            d.apply(FormAction::SetPrice(input.into())).unwrap();
            let errs = schema.validate(&d).unwrap_err();
            assert_eq!(errs.get(Field::Price).map(|e| &e.violation), Some(&expected), "{input}");
        }

        let mut d = valid_draft();
        d.apply(FormAction::SetPrice(" 0.5 ".into())).unwrap();
        assert_eq!(schema.validate(&d).unwrap().price, 0.5);
    }

    #[test]
    fn outside_enum_messages_list_the_field_options() {
        let outside = || Violation::OutsideEnum { token: "huge".into() };
        let category = FieldError::new(Field::Category, outside()).message;
        assert!(category.contains("T-shirts"), "{category}");

        let sizes = FieldError::new(Field::Sizes, outside()).message;
        assert!(sizes.contains("xs, s, m"), "{sizes}");
        assert!(!sizes.contains("T-shirts"), "{sizes}");

        let colors = FieldError::new(Field::Colors, outside()).message;
        assert!(colors.contains("blue"), "{colors}");

        let name = FieldError::new(Field::Name, outside()).message;
        assert_eq!(name, "Invalid option `huge`");
    }

    #[test]
    fn category_outside_the_set_is_rejected() {
        let mut d = valid_draft();
        d.apply(FormAction::SetCategory("Hats".into())).unwrap();
        let errs = ProductSchema::default().validate(&d).unwrap_err();
        assert_eq!(
            errs.get(Field::Category).map(|e| &e.violation),
            Some(&Violation::OutsideEnum { token: "Hats".into() })
        );
    }

    #[test]
    fn empty_draft_reports_every_required_field_in_form_order() {
        let errs = ProductSchema::default().validate(&ProductDraft::new()).unwrap_err();
        let fields: Vec<Field> = errs.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::ShortDescription,
                Field::Description,
                Field::Price,
                Field::Category
            ]
        );
        assert_eq!(errs.first_field(), Some(Field::Name));
        assert!(errs.iter().all(|e| e.violation == Violation::Required));
    }

    #[test]
    fn image_coverage_is_configurable() {
        let mut d = valid_draft();
        d.apply(FormAction::SetColor { color: Color::Red, checked: true }).unwrap();

        assert!(ProductSchema::new(ImageCoverage::Optional).validate(&d).is_ok());

        let errs = ProductSchema::new(ImageCoverage::Strict).validate(&d).unwrap_err();
        let e = errs.get(Field::Images).expect("images error");
        assert_eq!(e.violation, Violation::MissingImage { color: Color::Red });
        assert_eq!(e.message, "Upload an image for red");
    }

    #[test]
    fn coverage_parses_from_config_values() {
        assert_eq!(ImageCoverage::parse(" Strict "), Some(ImageCoverage::Strict));
        assert_eq!(ImageCoverage::parse("optional"), Some(ImageCoverage::Optional));
        assert_eq!(ImageCoverage::parse("always"), None);
    }

    #[test]
    fn errors_display_lists_field_keys() {
        let errs = ProductSchema::default().validate(&ProductDraft::new()).unwrap_err();
        assert_eq!(
            errs.to_string(),
            "5 invalid field(s): name, shortDescription, description, price, category"
        );
    }
}
