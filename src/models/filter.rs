use uuid::Uuid;

/// Pagination shared by every list query. A zero `size` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOpts {
    pub page: u32,
    pub size: u32,
}

impl ListOpts {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// `(limit, offset)` when paging is enabled. Pages below 1 are treated as page 1.
    pub fn limit_offset(&self) -> Option<(i64, i64)> {
        if self.size == 0 {
            return None;
        }
        let page = u64::from(self.page.max(1));
        let size = u64::from(self.size);
        let offset = (page - 1).saturating_mul(size).min(i64::MAX as u64) as i64;
        Some((i64::from(self.size), offset))
    }
}

/// Merge a singular convenience field into its plural set.
pub(crate) fn fold<T: Clone + PartialEq>(one: Option<&T>, many: &[T]) -> Vec<T> {
    let mut out = many.to_vec();
    if let Some(v) = one {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub list: ListOpts,
    pub ids: Vec<Uuid>,
    pub user_id: Option<Uuid>,
    pub user_ids: Vec<Uuid>,
    pub name: Option<String>,
    pub names: Vec<String>,
    pub name_pattern: Option<String>,
    pub parent_ids: Vec<Uuid>,
    /// Only tags without a parent.
    pub root_only: bool,
    pub level: Option<i64>,
}

impl TagFilter {
    pub fn user_ids(&self) -> Vec<Uuid> {
        fold(self.user_id.as_ref(), &self.user_ids)
    }

    pub fn names(&self) -> Vec<String> {
        fold(self.name.as_ref(), &self.names)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShareFilter {
    pub list: ListOpts,
    pub ids: Vec<Uuid>,
    pub user_id: Option<Uuid>,
    pub user_ids: Vec<Uuid>,
    pub slugs: Vec<String>,
    pub status: Option<super::ShareStatus>,
}

impl ShareFilter {
    pub fn user_ids(&self) -> Vec<Uuid> {
        fold(self.user_id.as_ref(), &self.user_ids)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    pub list: ListOpts,
    pub ids: Vec<Uuid>,
    pub target_ids: Vec<Uuid>,
    pub target_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaggableFilter {
    pub tag_ids: Vec<Uuid>,
    pub target_id: Option<Uuid>,
    pub target_ids: Vec<Uuid>,
    pub target_name: Option<String>,
    pub kind: Option<super::TagKind>,
}

impl TaggableFilter {
    /// Filter for every association of `target`, optionally narrowed to one kind.
    pub fn for_target(target: &impl super::Morphable, kind: Option<super::TagKind>) -> Self {
        Self {
            target_id: Some(target.morph_key()),
            target_name: Some(target.morph_name().to_string()),
            kind,
            ..Default::default()
        }
    }

    pub fn target_ids(&self) -> Vec<Uuid> {
        fold(self.target_id.as_ref(), &self.target_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset_disabled_without_size() {
        assert_eq!(ListOpts::new(3, 0).limit_offset(), None);
    }

    #[test]
    fn test_limit_offset_clamps_page() {
        assert_eq!(ListOpts::new(0, 10).limit_offset(), Some((10, 0)));
        assert_eq!(ListOpts::new(1, 10).limit_offset(), Some((10, 0)));
        assert_eq!(ListOpts::new(3, 10).limit_offset(), Some((10, 20)));
    }

    #[test]
    fn test_limit_offset_large_page_does_not_overflow() {
        let (limit, offset) = ListOpts::new(u32::MAX, u32::MAX).limit_offset().unwrap();
        assert_eq!(limit, i64::from(u32::MAX));
        assert_eq!(offset, i64::MAX);

        let (_, offset) = ListOpts::new(u32::MAX, 1).limit_offset().unwrap();
        assert_eq!(offset, i64::from(u32::MAX) - 1);
    }

    #[test]
    fn test_fold_singular_into_plural() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let filter = TagFilter {
            user_id: Some(a),
            user_ids: vec![b],
            ..Default::default()
        };
        let ids = filter.user_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));

        // Folding does not touch the filter itself
        assert_eq!(filter.user_ids, vec![b]);
    }

    #[test]
    fn test_fold_skips_duplicate() {
        let filter = TagFilter {
            name: Some("work".to_string()),
            names: vec!["work".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.names(), vec!["work".to_string()]);
    }
}
