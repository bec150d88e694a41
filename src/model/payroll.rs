use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,
    #[schema(value_type = String)]
    pub base_salary: Decimal,
    #[schema(value_type = String)]
    pub overtime_pay: Decimal,
    #[schema(value_type = String)]
    pub bonus: Decimal,
    #[schema(value_type = String)]
    pub deductions: Decimal,
    #[schema(value_type = String)]
    pub net_salary: Decimal,
}

pub fn net_salary(base: Decimal, overtime: Decimal, bonus: Decimal, deductions: Decimal) -> Decimal {
    base + overtime + bonus - deductions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_adds_overtime_and_bonus_then_deducts() {
        let net = net_salary(
            Decimal::new(5000000, 2),
            Decimal::from(400),
            Decimal::from(5000),
            Decimal::new(200050, 2),
        );
        assert_eq!(net, Decimal::new(5339950, 2));
    }
}
