use crate::ids::INTERNAL_ID;
use crate::value::Document;

/// Field selection in the space-separated form `"title body"` (only these),
/// `"-body"` (all but these) or `"+secret"` (also reveal a hidden field).
///
/// Inclusion wins when both inclusions and exclusions are given; only `-_id`
/// is honoured alongside inclusions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    include: Vec<String>,
    exclude: Vec<String>,
    reveal: Vec<String>,
}

impl Projection {
    #[must_use]
    pub fn parse(selection: &str) -> Self {
        let mut projection = Self::default();
        for token in selection.split_whitespace() {
            if let Some(field) = token.strip_prefix('+') {
                projection.reveal.push(field.to_string());
            } else if let Some(field) = token.strip_prefix('-') {
                projection.exclude.push(field.to_string());
            } else {
                projection.include.push(token.to_string());
            }
        }

        if !projection.include.is_empty() {
            let ignored = projection.exclude.iter().filter(|f| *f != INTERNAL_ID).count();
            if ignored > 0 {
                tracing::warn!(
                    selection = %selection,
                    "exclusions are ignored in an inclusive projection"
                );
            }
        }
        projection
    }

    /// Applies the selection. `hidden` lists fields removed unless revealed
    /// or explicitly included.
    #[must_use]
    pub fn apply<'a>(
        &self,
        mut document: Document,
        hidden: impl IntoIterator<Item = &'a str>,
    ) -> Document {
        for field in hidden {
            let wanted = self.reveal.iter().any(|f| f == field)
                || self.include.iter().any(|f| f == field);
            if !wanted {
                document.shift_remove(field);
            }
        }

        let drop_id = self.exclude.iter().any(|f| f == INTERNAL_ID);
        if self.include.is_empty() {
            for field in &self.exclude {
                document.shift_remove(field);
            }
            return document;
        }

        document.retain(|field, _| {
            if field == INTERNAL_ID {
                return !drop_id;
            }
            self.include.iter().any(|f| f == field) || self.reveal.iter().any(|f| f == field)
        });
        document
    }
}

/// Applies an optional projection. Hidden fields are removed either way
/// unless the projection asks for them.
#[must_use]
pub fn project<'a>(
    document: Document,
    projection: Option<&Projection>,
    hidden: impl IntoIterator<Item = &'a str>,
) -> Document {
    match projection {
        Some(projection) => projection.apply(document, hidden),
        None => Projection::default().apply(document, hidden),
    }
}
