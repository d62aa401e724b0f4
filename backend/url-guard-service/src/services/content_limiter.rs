use crate::services::access::AccessTier;

/// Items already delivered to one caller across a sequence of pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryCursor {
    delivered: usize,
}

impl DeliveryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor for page `page` (1-based) of fixed-size pages.
    pub fn for_page(page: u32, page_size: u32) -> Self {
        Self {
            delivered: (page.saturating_sub(1) as usize).saturating_mul(page_size as usize),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

/// Items released to the caller and whether more pages may follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shaped<T> {
    pub items: Vec<T>,
    pub exhausted: bool,
}

/// Caps how much externally fetched content each access tier receives.
#[derive(Debug, Clone, Copy)]
pub struct TieredContentLimiter {
    guest_ceiling: usize,
}

impl TieredContentLimiter {
    pub fn new(guest_ceiling: usize) -> Self {
        Self { guest_ceiling }
    }

    /// Cumulative item ceiling for `tier`, `None` when unlimited.
    pub fn max_items(&self, tier: AccessTier) -> Option<usize> {
        match tier {
            AccessTier::Guest => Some(self.guest_ceiling),
            AccessTier::Authenticated => None,
        }
    }

    /// True once `cursor` has reached the tier's ceiling.
    pub fn is_exhausted(&self, tier: AccessTier, cursor: &DeliveryCursor) -> bool {
        self.max_items(tier)
            .is_some_and(|ceiling| cursor.delivered >= ceiling)
    }

    /// Truncate `items` so the cumulative delivery stays within the tier's
    /// ceiling and advance `cursor` by what was released.
    pub fn shape<T>(&self, mut items: Vec<T>, tier: AccessTier, cursor: &mut DeliveryCursor) -> Shaped<T> {
        if let Some(ceiling) = self.max_items(tier) {
            let remaining = ceiling.saturating_sub(cursor.delivered);
            if items.len() > remaining {
                tracing::debug!(
                    dropped = items.len() - remaining,
                    ceiling,
                    "Truncating guest content at cumulative ceiling"
                );
                items.truncate(remaining);
            }
        }

        cursor.delivered += items.len();

        Shaped {
            exhausted: self.is_exhausted(tier, cursor),
            items,
        }
    }
}
