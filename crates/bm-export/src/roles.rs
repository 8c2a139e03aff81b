//! Booklet roles and their page assignment.
//!
//! A folded booklet has four faces. Printed as two landscape sheets, the
//! outer sheet carries the back cover beside the cover, and the inner
//! sheet carries the two inside pages.

use crate::error::ExportError;
use bm_core::{Page, PageId, ProjectDocument};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of pages a booklet is made of.
pub const BOOKLET_PAGES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookletRole {
    /// Capa.
    Cover,
    /// Contracapa.
    BackCover,
    /// Miolo 1.
    InnerLeft,
    /// Miolo 2.
    InnerRight,
}

impl BookletRole {
    /// Roles in the order pages are assigned by default.
    pub const ALL: [BookletRole; 4] = [
        BookletRole::Cover,
        BookletRole::BackCover,
        BookletRole::InnerLeft,
        BookletRole::InnerRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookletRole::Cover => "cover",
            BookletRole::BackCover => "backCover",
            BookletRole::InnerLeft => "innerLeft",
            BookletRole::InnerRight => "innerRight",
        }
    }

    /// Accepts the English names and the Portuguese ones shown in the dialog.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cover" | "capa" => Some(BookletRole::Cover),
            "backCover" | "back-cover" | "contracapa" => Some(BookletRole::BackCover),
            "innerLeft" | "inner-left" | "miolo1" => Some(BookletRole::InnerLeft),
            "innerRight" | "inner-right" | "miolo2" => Some(BookletRole::InnerRight),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookletRole::Cover => "Capa",
            BookletRole::BackCover => "Contracapa",
            BookletRole::InnerLeft => "Miolo 1",
            BookletRole::InnerRight => "Miolo 2",
        }
    }
}

impl fmt::Display for BookletRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per booklet role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMap<T> {
    pub cover: T,
    pub back_cover: T,
    pub inner_left: T,
    pub inner_right: T,
}

impl<T> RoleMap<T> {
    pub fn get(&self, role: BookletRole) -> &T {
        match role {
            BookletRole::Cover => &self.cover,
            BookletRole::BackCover => &self.back_cover,
            BookletRole::InnerLeft => &self.inner_left,
            BookletRole::InnerRight => &self.inner_right,
        }
    }

    pub fn get_mut(&mut self, role: BookletRole) -> &mut T {
        match role {
            BookletRole::Cover => &mut self.cover,
            BookletRole::BackCover => &mut self.back_cover,
            BookletRole::InnerLeft => &mut self.inner_left,
            BookletRole::InnerRight => &mut self.inner_right,
        }
    }

    /// Build from values listed in [`BookletRole::ALL`] order.
    pub fn from_array([cover, back_cover, inner_left, inner_right]: [T; 4]) -> Self {
        Self {
            cover,
            back_cover,
            inner_left,
            inner_right,
        }
    }
}

/// Which page prints as which face of the booklet. Any page may take any
/// role, including more than one.
pub type RoleAssignment = RoleMap<PageId>;

impl RoleAssignment {
    /// Default assignment: pages in document order take the roles in
    /// [`BookletRole::ALL`] order.
    pub fn from_pages(pages: &[Page]) -> Result<Self, ExportError> {
        require_booklet(pages)?;
        Ok(Self::from_array([pages[0].id, pages[1].id, pages[2].id, pages[3].id]))
    }

    pub fn assign(&mut self, role: BookletRole, page: PageId) {
        *self.get_mut(role) = page;
    }

    /// Check the project still has the four pages this assignment names.
    pub fn validate(&self, project: &ProjectDocument) -> Result<(), ExportError> {
        require_booklet(&project.pages)?;
        for role in BookletRole::ALL {
            let id = *self.get(role);
            if project.page(id).is_none() {
                return Err(ExportError::UnknownPage(id));
            }
        }
        Ok(())
    }
}

/// Refuse anything but a four-page document.
pub fn require_booklet(pages: &[Page]) -> Result<(), ExportError> {
    if pages.len() != BOOKLET_PAGES {
        return Err(ExportError::PageCount {
            required: BOOKLET_PAGES,
            actual: pages.len(),
        });
    }
    Ok(())
}
