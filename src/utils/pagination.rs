use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::{
    department::Department, employee::Employee, leave_application::LeaveApplication,
    payroll::Payroll,
};

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
    pub offset: u32,
}

impl Page {
    /// 1-based page; `per_page` is clamped to 1..=100.
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
        Self {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Items per page
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[aliases(
    EmployeePage = Paginated<Employee>,
    DepartmentPage = Paginated<Department>,
    LeavePage = Paginated<LeaveApplication>,
    PayrollPage = Paginated<Payroll>
)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, page: Page, total: i64) -> Self {
        Self {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = Page::new(None, None, 20);
        assert_eq!((p.page, p.per_page, p.offset), (1, 20, 0));

        let p = Page::new(Some(0), Some(500), 20);
        assert_eq!((p.page, p.per_page, p.offset), (1, 100, 0));

        let p = Page::new(Some(3), Some(5), 20);
        assert_eq!(p.offset, 10);
    }
}
