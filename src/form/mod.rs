pub mod course_plan;
pub mod suppliers;

pub use course_plan::{CoursePlan, CoursePlanApp, CoursePlanForm, COURSE_PLAN_PROBLEM_ID};
pub use suppliers::{
    CompanyRow, SupplierForm, SupplierOrderRow, SupplierRow, MAX_ORDER_SLOTS, MAX_SUPPLIERS,
    SUPPLIER_ORDERS_PROBLEM_ID,
};
