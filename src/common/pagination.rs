// src/common/pagination.rs

use serde::Serialize;

/// Itens por página em todas as listagens.
pub const PAGINATION_ITEMS: i64 = 10;

// Página de resultados devolvida pelas listagens filtradas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, total: i64) -> Self {
        Self {
            items,
            page,
            per_page: PAGINATION_ITEMS,
            total,
            pages: page_count(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// Normaliza o número da página vindo da query (1 é a primeira).
pub fn normalize_page(page: Option<i64>) -> i64 {
    page.filter(|p| *p >= 1).unwrap_or(1)
}

/// Páginas além do fim saturam em vez de estourar; o banco devolve vazio.
pub fn offset_for(page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(PAGINATION_ITEMS)
}

fn page_count(total: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + PAGINATION_ITEMS - 1) / PAGINATION_ITEMS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pages_fall_back_to_first() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(-4)), 1);
        assert_eq!(normalize_page(Some(3)), 3);
    }

    #[test]
    fn offsets_and_page_counts() {
        assert_eq!(offset_for(1), 0);
        assert_eq!(offset_for(3), 20);

        assert_eq!(Page::<i32>::new(vec![], 1, 0).pages, 0);
        assert_eq!(Page::<i32>::new(vec![], 1, 10).pages, 1);
        assert_eq!(Page::<i32>::new(vec![], 1, 11).pages, 2);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let page = normalize_page(Some(i64::MAX));
        assert_eq!(offset_for(page), i64::MAX);
        assert!(offset_for(page) >= 0);
        assert_eq!(offset_for(i64::MAX / PAGINATION_ITEMS), (i64::MAX / PAGINATION_ITEMS - 1) * 10);

        let empty = Page::<i32>::new(vec![], page, 25);
        assert!(empty.items.is_empty());
        assert_eq!(empty.pages, 3);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 2, 13).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 13);
        assert_eq!(page.pages, 2);
    }
}
