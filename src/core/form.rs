//! Product draft and its reducer.
//!
//! Every user edit is one [`FormAction`] applied atomically by
//! [`ProductDraft::apply`].  The draft's fields are private so the reducer is
//! the only writer, which keeps `images` keyed by a subset of `colors` at
//! every observable state: unchecking a color drops its image in the same
//! step, and attaching an image to an unchecked color is refused.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::catalog::{Color, Size};
use super::image::ImageRef;
use super::validation::{Field, FieldError, Violation};

/// One user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    SetName(String),
    SetShortDescription(String),
    SetDescription(String),
    /// Raw price text as typed; parsed at validation time.
    SetPrice(String),
    /// Raw category token; checked against the closed set at validation time.
    SetCategory(String),
    SetSize { size: Size, checked: bool },
    SetColor { color: Color, checked: bool },
    AttachImage { color: Color, image: ImageRef },
    DetachImage(Color),
    Reset,
}

/// In-progress, not-yet-validated product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    name: String,
    short_description: String,
    description: String,
    price: String,
    category: Option<String>,
    sizes: BTreeSet<Size>,
    colors: BTreeSet<Color>,
    images: BTreeMap<Color, ImageRef>,
}

impl ProductDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Selected sizes, in checkbox-declaration order.
    pub fn sizes(&self) -> &BTreeSet<Size> {
        &self.sizes
    }

    /// Selected colors, in checkbox-declaration order.
    pub fn colors(&self) -> &BTreeSet<Color> {
        &self.colors
    }

    pub fn images(&self) -> &BTreeMap<Color, ImageRef> {
        &self.images
    }

    /// Upload slots: exactly one per selected color, in declaration order.
    pub fn image_slots(&self) -> impl Iterator<Item = (Color, Option<&ImageRef>)> + '_ {
        self.colors.iter().map(|&c| (c, self.images.get(&c)))
    }

    /// Convenience toggle used by checkbox widgets.
    pub fn toggle_size(&self, size: Size) -> FormAction {
        FormAction::SetSize {
            size,
            checked: !self.sizes.contains(&size),
        }
    }

    pub fn toggle_color(&self, color: Color) -> FormAction {
        FormAction::SetColor {
            color,
            checked: !self.colors.contains(&color),
        }
    }

    /// Apply one edit.  On error the draft is left exactly as it was.
    pub fn apply(&mut self, action: FormAction) -> Result<(), FieldError> {
        debug!(?action, "form action");
        match action {
            FormAction::SetName(v) => self.name = v,
            FormAction::SetShortDescription(v) => self.short_description = v,
            FormAction::SetDescription(v) => self.description = v,
            FormAction::SetPrice(v) => self.price = v,
            FormAction::SetCategory(v) => self.category = Some(v),
            FormAction::SetSize { size, checked } => {
                if checked {
                    self.sizes.insert(size);
                } else {
                    self.sizes.remove(&size);
                }
            }
            FormAction::SetColor { color, checked } => {
                if checked {
                    self.colors.insert(color);
                } else {
                    self.colors.remove(&color);
                    self.images.remove(&color);
                }
            }
            FormAction::AttachImage { color, image } => {
                if !self.colors.contains(&color) {
                    return Err(FieldError::new(
                        Field::Images,
                        Violation::ImageWithoutColor { color },
                    ));
                }
                self.images.insert(color, image);
            }
            FormAction::DetachImage(color) => {
                self.images.remove(&color);
            }
            FormAction::Reset => *self = Self::default(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn image(name: &str) -> ImageRef {
        ImageRef {
            path: PathBuf::from(name),
            mime: "image/png".into(),
            width: 8,
            height: 8,
        }
    }

    fn images_subset_of_colors(d: &ProductDraft) -> bool {
        d.images().keys().all(|c| d.colors().contains(c))
    }

    #[test]
    fn size_toggle_round_trips() {
        let mut d = ProductDraft::new();
        d.apply(FormAction::SetSize { size: Size::L, checked: true }).unwrap();
        let before = d.sizes().clone();

        d.apply(d.toggle_size(Size::M)).unwrap();
        d.apply(d.toggle_size(Size::M)).unwrap();
        assert_eq!(d.sizes(), &before);
    }

    #[test]
    fn two_sizes_in_either_order_give_the_same_set() {
        let mut a = ProductDraft::new();
        a.apply(a.toggle_size(Size::Eu42)).unwrap();
        a.apply(a.toggle_size(Size::Xs)).unwrap();

        let mut b = ProductDraft::new();
        b.apply(b.toggle_size(Size::Xs)).unwrap();
        b.apply(b.toggle_size(Size::Eu42)).unwrap();

        assert_eq!(a.sizes(), b.sizes());
        assert_eq!(a.sizes().iter().copied().collect::<Vec<_>>(), vec![Size::Xs, Size::Eu42]);
    }

    #[test]
    fn checking_an_already_checked_token_is_a_no_op() {
        let mut d = ProductDraft::new();
        d.apply(FormAction::SetColor { color: Color::Red, checked: true }).unwrap();
        d.apply(FormAction::SetColor { color: Color::Red, checked: true }).unwrap();
        assert_eq!(d.colors().len(), 1);
    }

    #[test]
    fn removing_a_color_retracts_its_image_slot_and_image() {
        let mut d = ProductDraft::new();
        d.apply(d.toggle_color(Color::Red)).unwrap();
        assert!(images_subset_of_colors(&d));

        let slots: Vec<_> = d.image_slots().collect();
        assert_eq!(slots, vec![(Color::Red, None)]);

        d.apply(FormAction::AttachImage { color: Color::Red, image: image("red.png") })
            .unwrap();
        assert!(images_subset_of_colors(&d));
        assert_eq!(d.images().get(&Color::Red), Some(&image("red.png")));

        d.apply(d.toggle_color(Color::Red)).unwrap();
        assert!(images_subset_of_colors(&d));
        assert_eq!(d.image_slots().count(), 0);
        assert!(d.images().is_empty());
    }

    #[test]
    fn attaching_to_an_unselected_color_is_refused() {
        let mut d = ProductDraft::new();
        d.apply(d.toggle_color(Color::Blue)).unwrap();
        let before = d.clone();

        let err = d
            .apply(FormAction::AttachImage { color: Color::Green, image: image("g.png") })
            .unwrap_err();
        assert_eq!(err.field, Field::Images);
        assert_eq!(err.violation, Violation::ImageWithoutColor { color: Color::Green });
        assert_eq!(d, before);
    }

    #[test]
    fn slots_follow_declaration_order_not_click_order() {
        let mut d = ProductDraft::new();
        for c in [Color::Black, Color::Blue, Color::Pink] {
            d.apply(d.toggle_color(c)).unwrap();
        }
        let order: Vec<Color> = d.image_slots().map(|(c, _)| c).collect();
        assert_eq!(order, vec![Color::Blue, Color::Pink, Color::Black]);
    }

    #[test]
    fn detach_keeps_the_slot() {
        let mut d = ProductDraft::new();
        d.apply(d.toggle_color(Color::Gray)).unwrap();
        d.apply(FormAction::AttachImage { color: Color::Gray, image: image("x.png") })
            .unwrap();
        d.apply(FormAction::DetachImage(Color::Gray)).unwrap();
        assert_eq!(d.image_slots().collect::<Vec<_>>(), vec![(Color::Gray, None)]);
    }

    #[test]
    fn reset_returns_to_an_empty_draft() {
        let mut d = ProductDraft::new();
        d.apply(FormAction::SetName("Tee".into())).unwrap();
        d.apply(d.toggle_color(Color::Red)).unwrap();
        d.apply(FormAction::Reset).unwrap();
        assert_eq!(d, ProductDraft::new());
    }
}
