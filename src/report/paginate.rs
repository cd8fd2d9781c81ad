//! Splitting a tall raster across fixed-size pages.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Page dimensions in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageSize {
    /// ISO A4, portrait
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };
}

/// Most pages a single report may span
pub const MAX_PAGES: usize = 200;

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Placement of one raster across consecutive pages.
///
/// The whole image is drawn on every page at full page width; each page
/// shifts it up by one page height so the next slice shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub page: PageSize,
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    /// Vertical image offset on each page, 0 for the first and negative after
    pub offsets_mm: Vec<f64>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.offsets_mm.len()
    }
}

/// Lay out a `width` × `height` pixel raster over pages of `page` size.
///
/// Rasters that would need more than [`MAX_PAGES`] pages are rejected.
pub fn paginate(width: u32, height: u32, page: PageSize) -> Result<PageLayout, ReportError> {
    if width == 0 || height == 0 {
        return Err(ReportError::EmptyRaster { width, height });
    }

    let aspect = width as f64 / height as f64;
    let image_height_mm = page.width_mm / aspect;

    let needed = (image_height_mm / page.height_mm).ceil();
    if !needed.is_finite() || needed > MAX_PAGES as f64 {
        return Err(ReportError::TooManyPages {
            width,
            height,
            max: MAX_PAGES,
        });
    }

    let mut offsets_mm = vec![0.0];
    let mut position = 0.0;
    let mut height_left = image_height_mm - page.height_mm;

    while height_left > 0.0 && offsets_mm.len() < MAX_PAGES {
        position -= page.height_mm;
        offsets_mm.push(position);
        height_left -= page.height_mm;
    }

    Ok(PageLayout {
        page,
        image_width_mm: page.width_mm,
        image_height_mm,
        offsets_mm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_raster_single_page() {
        let layout = paginate(1600, 800, PageSize::A4).unwrap();
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.offsets_mm, vec![0.0]);
        assert!((layout.image_height_mm - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_tall_raster_spans_pages() {
        // 210 / (1600 / 4000) = 525mm tall
        let layout = paginate(1600, 4000, PageSize::A4).unwrap();
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.offsets_mm, vec![0.0, -297.0]);
    }

    #[test]
    fn test_very_tall_raster() {
        // 210 / (100 / 1000) = 2100mm → 8 pages (7 * 297 = 2079)
        let layout = paginate(100, 1000, PageSize::A4).unwrap();
        assert_eq!(layout.page_count(), 8);
        assert_eq!(*layout.offsets_mm.last().unwrap(), -297.0 * 7.0);
    }

    #[test]
    fn test_exact_page_height_is_one_page() {
        let page = PageSize {
            width_mm: 200.0,
            height_mm: 200.0,
        };
        let layout = paginate(400, 400, page).unwrap();
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn test_page_limit() {
        // 210 / (1 / 1000) = 210000mm, far beyond the limit
        assert!(matches!(
            paginate(1, 1000, PageSize::A4),
            Err(ReportError::TooManyPages { max: MAX_PAGES, .. })
        ));
        assert!(matches!(
            paginate(1, u32::MAX, PageSize::A4),
            Err(ReportError::TooManyPages { .. })
        ));

        // 210 / (100 / 14140) ≈ 29694mm → 100 pages, within the limit
        let layout = paginate(100, 14_140, PageSize::A4).unwrap();
        assert_eq!(layout.page_count(), 100);
    }

    #[test]
    fn test_empty_raster_rejected() {
        assert!(matches!(
            paginate(0, 100, PageSize::A4),
            Err(ReportError::EmptyRaster { .. })
        ));
        assert!(paginate(100, 0, PageSize::A4).is_err());
    }
}
