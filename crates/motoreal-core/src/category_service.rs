use motoreal_domain::{category::ids, CategoryItem, OwnershipType, Snapshot, TransactionType};

use crate::validation::ensure_non_empty;
use crate::CoreError;

pub struct CategoryService;

impl CategoryService {
    pub fn add(snapshot: &mut Snapshot, mut category: CategoryItem) -> Result<String, CoreError> {
        category.label = category.label.trim().to_string();
        ensure_non_empty(&category.label, "category label")?;
        let duplicate = snapshot
            .categories
            .iter()
            .any(|existing| existing.label.to_lowercase() == category.label.to_lowercase());
        if duplicate {
            return Err(CoreError::Validation(format!(
                "category `{}` already exists",
                category.label
            )));
        }
        category.is_system = false;
        let id = category.id.clone();
        snapshot.categories.push(category);
        Ok(id)
    }

    /// Removes a user-defined category. Transactions keep the dangling id.
    pub fn remove(snapshot: &mut Snapshot, id: &str) -> Result<CategoryItem, CoreError> {
        let index = snapshot
            .categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;
        if snapshot.categories[index].is_system {
            return Err(CoreError::InvalidOperation(format!(
                "system category `{}` cannot be deleted",
                snapshot.categories[index].label
            )));
        }
        Ok(snapshot.categories.remove(index))
    }

    /// Categories offered for a transaction type and vehicle ownership mode.
    ///
    /// Rent only shows for rented vehicles, financing only for financed ones.
    pub fn visible<'a>(
        snapshot: &'a Snapshot,
        kind: Option<TransactionType>,
        ownership: Option<OwnershipType>,
    ) -> Vec<&'a CategoryItem> {
        snapshot
            .categories
            .iter()
            .filter(|category| kind.map_or(true, |kind| category.accepts(kind)))
            .filter(|category| match category.id.as_str() {
                ids::RENT => ownership == Some(OwnershipType::Rented),
                ids::FINANCING => ownership == Some(OwnershipType::Financed),
                _ => true,
            })
            .collect()
    }

    /// Resolves a category by id or label, ignoring case.
    pub fn resolve<'a>(snapshot: &'a Snapshot, input: &str) -> Result<&'a CategoryItem, CoreError> {
        let needle = input.trim().to_lowercase();
        snapshot
            .categories
            .iter()
            .find(|category| category.id.to_lowercase() == needle)
            .or_else(|| {
                snapshot
                    .categories
                    .iter()
                    .find(|category| category.label.to_lowercase() == needle)
            })
            .ok_or_else(|| CoreError::CategoryNotFound(input.trim().to_string()))
    }
}
