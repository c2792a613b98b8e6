use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::{decode_matrix, SolverResponse};
use crate::error::{PlannerError, Result};
use crate::submit::ProblemForm;

pub const SUPPLIER_ORDERS_PROBLEM_ID: &str = "supplier_orders";

/// Header used to name generated supplier rows ("Supplier 1", ...).
pub const SUPPLIER_LABEL: &str = "Supplier";

/// Largest supplier grid a form may ask for.
pub const MAX_SUPPLIERS: usize = 500;

/// Largest number of order columns a form may produce.
pub const MAX_ORDER_SLOTS: usize = 1000;

/// The single row of the company grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyRow {
    /// Desired supplier count. Drives the size of the supplier grid.
    pub suppliers: Option<i64>,
    /// Stock need in days.
    #[serde(default)]
    pub stock_need: f64,
    #[serde(default)]
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRow {
    pub supplier: String,
    #[serde(default)]
    pub bulk_units: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub lead_time: f64,
}

impl SupplierRow {
    /// Blank row for the 1-based position `n`.
    pub fn placeholder(n: usize) -> Self {
        SupplierRow {
            supplier: format!("{} {}", SUPPLIER_LABEL, n),
            bulk_units: 0.0,
            total_cost: 0.0,
            lead_time: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierForm {
    pub company: CompanyRow,
    #[serde(default)]
    pub suppliers: Vec<SupplierRow>,
}

/// One output row: what the solver ordered from a supplier in each order slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierOrderRow {
    pub supplier: String,
    pub orders: Vec<f64>,
}

impl SupplierForm {
    /// Grows or truncates the supplier grid to the company row's count.
    ///
    /// Existing rows keep their edits; new rows continue the numbering.
    /// A missing or negative count leaves the grid as it is; counts above
    /// [`MAX_SUPPLIERS`] are clamped.
    pub fn sync_suppliers(&mut self) {
        let target = match self.company.suppliers {
            Some(n) if n >= 0 => usize::try_from(n).map_or(MAX_SUPPLIERS, |n| n.min(MAX_SUPPLIERS)),
            _ => return,
        };
        let current = self.suppliers.len();
        if current < target {
            self.suppliers
                .extend((current + 1..=target).map(SupplierRow::placeholder));
        } else {
            self.suppliers.truncate(target);
        }
        debug!(from = current, to = target, "synced supplier grid");
    }

    /// Number of order columns: `floor(stock_need / shortest lead time)`.
    ///
    /// 0 when there are no suppliers or the shortest lead time is not positive.
    /// Never more than [`MAX_ORDER_SLOTS`].
    pub fn order_slots(&self) -> usize {
        let slots = self.raw_order_slots();
        if slots >= MAX_ORDER_SLOTS as f64 {
            MAX_ORDER_SLOTS
        } else {
            slots as usize
        }
    }

    fn raw_order_slots(&self) -> f64 {
        let min_lead_time = self
            .suppliers
            .iter()
            .map(|s| s.lead_time)
            .fold(f64::INFINITY, f64::min);
        if !min_lead_time.is_finite() || min_lead_time <= 0.0 {
            return 0.0;
        }
        let slots = (self.company.stock_need / min_lead_time).floor();
        if slots > 0.0 {
            slots
        } else {
            0.0
        }
    }

    /// Rejects grid sizes the server will not allocate.
    pub fn check_limits(&self) -> Result<()> {
        let requested = self.company.suppliers.unwrap_or(0);
        if requested > MAX_SUPPLIERS as i64 || self.suppliers.len() > MAX_SUPPLIERS {
            return Err(PlannerError::Validation(format!(
                "At most {} suppliers are supported",
                MAX_SUPPLIERS
            )));
        }
        if self.raw_order_slots() > MAX_ORDER_SLOTS as f64 {
            return Err(PlannerError::Validation(format!(
                "Stock need over shortest lead time gives more than {} order slots",
                MAX_ORDER_SLOTS
            )));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.check_limits()?;
        if self.suppliers.is_empty() {
            return Err(PlannerError::Validation(
                "At least one supplier is required".to_string(),
            ));
        }
        if let Some(bad) = self.suppliers.iter().find(|s| s.lead_time < 0.0) {
            return Err(PlannerError::Validation(format!(
                "Lead time for {} cannot be negative",
                bad.supplier
            )));
        }
        if self.company.stock_need < 0.0 {
            return Err(PlannerError::Validation(
                "Stock need cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_request(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "companyData": [serde_json::to_value(&self.company)?],
            "supplierData": serde_json::to_value(&self.suppliers)?,
        }))
    }

    pub fn decode_orders(&self, response: &SolverResponse) -> Vec<SupplierOrderRow> {
        let matrix = decode_matrix(response, self.suppliers.len(), self.order_slots());
        self.suppliers
            .iter()
            .zip(matrix)
            .map(|(row, orders)| SupplierOrderRow {
                supplier: row.supplier.clone(),
                orders,
            })
            .collect()
    }
}

impl ProblemForm for SupplierForm {
    type Output = Vec<SupplierOrderRow>;

    fn problem_id(&self) -> &str {
        SUPPLIER_ORDERS_PROBLEM_ID
    }

    fn build_request(&self) -> Result<serde_json::Value> {
        self.validate()?;
        SupplierForm::build_request(self)
    }

    fn handle_response(&self, response: &SolverResponse) -> Result<Vec<SupplierOrderRow>> {
        Ok(self.decode_orders(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn supplier(name: &str, lead_time: f64) -> SupplierRow {
        SupplierRow {
            supplier: name.to_string(),
            bulk_units: 10.0,
            total_cost: 100.0,
            lead_time,
        }
    }

    fn form(count: Option<i64>, stock_need: f64, suppliers: Vec<SupplierRow>) -> SupplierForm {
        SupplierForm {
            company: CompanyRow {
                suppliers: count,
                stock_need,
                units: 0.0,
            },
            suppliers,
        }
    }

    #[test]
    fn sync_grows_with_numbered_placeholders() {
        let mut f = form(Some(3), 0.0, vec![supplier("Acme", 2.0)]);
        f.sync_suppliers();
        let names: Vec<&str> = f.suppliers.iter().map(|s| s.supplier.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Supplier 2", "Supplier 3"]);
        assert_eq!(f.suppliers[0].lead_time, 2.0);
    }

    #[test]
    fn sync_truncates() {
        let mut f = form(
            Some(1),
            0.0,
            vec![supplier("A", 1.0), supplier("B", 1.0), supplier("C", 1.0)],
        );
        f.sync_suppliers();
        assert_eq!(f.suppliers, vec![supplier("A", 1.0)]);
    }

    #[test]
    fn sync_ignores_missing_or_negative_count() {
        let mut f = form(None, 0.0, vec![supplier("A", 1.0)]);
        f.sync_suppliers();
        assert_eq!(f.suppliers.len(), 1);

        f.company.suppliers = Some(-1);
        f.sync_suppliers();
        assert_eq!(f.suppliers.len(), 1);

        f.company.suppliers = Some(0);
        f.sync_suppliers();
        assert!(f.suppliers.is_empty());
    }

    #[test]
    fn order_slots_from_shortest_lead_time() {
        let f = form(Some(2), 10.0, vec![supplier("A", 3.0), supplier("B", 4.0)]);
        assert_eq!(f.order_slots(), 3);

        let zero = form(Some(2), 10.0, vec![supplier("A", 0.0), supplier("B", 4.0)]);
        assert_eq!(zero.order_slots(), 0);

        let none = form(Some(0), 10.0, vec![]);
        assert_eq!(none.order_slots(), 0);
    }

    #[test]
    fn decodes_order_grid() {
        let f = form(Some(2), 10.0, vec![supplier("A", 5.0), supplier("B", 6.0)]);
        let response: SolverResponse =
            serde_json::from_value(json!({"0_0": 1, "0_1": 0, "1_1": 1, "slack_0": 1})).unwrap();
        let rows = f.decode_orders(&response);
        assert_eq!(
            rows,
            vec![
                SupplierOrderRow {
                    supplier: "A".into(),
                    orders: vec![1.0, 0.0]
                },
                SupplierOrderRow {
                    supplier: "B".into(),
                    orders: vec![0.0, 1.0]
                },
            ]
        );
    }

    #[test]
    fn request_payload_shape() {
        let f = form(Some(1), 7.0, vec![supplier("A", 2.0)]);
        let payload = f.build_request().unwrap();
        assert_eq!(payload["companyData"][0]["suppliers"], 1);
        assert_eq!(payload["companyData"][0]["stock_need"], 7.0);
        assert_eq!(payload["supplierData"][0]["supplier"], "A");
        assert_eq!(payload["supplierData"][0]["lead_time"], 2.0);
    }

    #[test]
    fn validation() {
        assert!(form(Some(0), 1.0, vec![]).validate().is_err());
        assert!(form(Some(1), 1.0, vec![supplier("A", -1.0)]).validate().is_err());
        assert!(form(Some(1), -1.0, vec![supplier("A", 1.0)]).validate().is_err());
        assert!(form(Some(1), 1.0, vec![supplier("A", 1.0)]).validate().is_ok());
    }

    #[test]
    fn huge_supplier_count_is_clamped_and_rejected() {
        let mut f = form(Some(9_000_000_000_000_000_000), 0.0, vec![supplier("A", 1.0)]);
        assert!(matches!(f.check_limits(), Err(PlannerError::Validation(_))));
        assert!(f.validate().is_err());

        f.sync_suppliers();
        assert_eq!(f.suppliers.len(), MAX_SUPPLIERS);
        assert_eq!(f.suppliers[0].supplier, "A");

        f.company.suppliers = Some(MAX_SUPPLIERS as i64);
        assert!(f.check_limits().is_ok());
    }

    #[test]
    fn huge_order_slot_count_is_clamped_and_rejected() {
        let f = form(Some(1), 1e30, vec![supplier("A", 1e-9)]);
        assert_eq!(f.order_slots(), MAX_ORDER_SLOTS);
        assert!(matches!(f.check_limits(), Err(PlannerError::Validation(_))));

        let rows = f.decode_orders(&SolverResponse::new());
        assert_eq!(rows[0].orders.len(), MAX_ORDER_SLOTS);

        let at_limit = form(Some(1), MAX_ORDER_SLOTS as f64, vec![supplier("A", 1.0)]);
        assert_eq!(at_limit.order_slots(), MAX_ORDER_SLOTS);
        assert!(at_limit.check_limits().is_ok());
    }
}
