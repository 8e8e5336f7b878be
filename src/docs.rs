use crate::api::leave_balance::BalanceQuery;
use crate::api::leave_request::{LeaveFilter, LeaveListResponse};
use crate::model::holiday::{Holiday, HolidayInput};
use crate::model::leave::{
    Leave, LeaveActionInput, LeaveAdminAddInput, LeaveApplyInput, LeaveStatus, LeaveTiming,
    LeaveTimingOption, LeaveView, OverlappingLeave,
};
use crate::model::leave_balance::{LeaveAdjustmentInput, LeaveBalance, LeaveBalanceView};
use crate::model::leave_type::{LeaveType, LeaveTypeInput};
use crate::model::payroll::{
    PayrollPreview, PayrollRunRequest, PayrollStatus, Payslip, PayslipDraft, PayslipStatus,
    PayslipWithdrawInput,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave & Payroll API",
        version = "1.0.0",
        description = r#"
## Leave Lifecycle & Payroll Settlement

### 🔹 Key Features
- **Leave Requests**
  - Apply, two-tier approval (manager, then admin), cancellation and withdrawal
  - Overlap detection and working-day counting that skips weekends and holidays
- **Leave Balances**
  - Yearly ledger per employee and leave type, seeded on first use
  - Manual credit/debit adjustments
- **Holidays**
  - Company holiday calendar used by every day count
- **Payroll**
  - Monthly preview and finalization with unpaid-leave deductions
  - Payslip listing and withdrawal

### 🔐 Security
Every endpoint under `/api` requires a **JWT Bearer** access token.

### 📦 Errors
Failures return `{"success": false, "error": "...", "details": {...}}`.
"#,
    ),
    paths(
        crate::api::leave_request::apply_leave,
        crate::api::leave_request::admin_add_leave,
        crate::api::leave_request::action_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::withdraw_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_timings,
        crate::api::leave_request::get_leave,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_balance::employee_balances,
        crate::api::leave_balance::get_balance,
        crate::api::leave_balance::adjust_balance,

        crate::api::holiday::list_holidays,
        crate::api::holiday::add_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::payroll::run_payroll,
        crate::api::payroll::finalize_payroll,
        crate::api::payroll::list_payslips,
        crate::api::payroll::withdraw_payslip
    ),
    components(
        schemas(
            Leave,
            LeaveView,
            LeaveStatus,
            LeaveTiming,
            LeaveTimingOption,
            LeaveApplyInput,
            LeaveAdminAddInput,
            LeaveActionInput,
            LeaveFilter,
            LeaveListResponse,
            OverlappingLeave,
            LeaveType,
            LeaveTypeInput,
            LeaveBalance,
            LeaveBalanceView,
            LeaveAdjustmentInput,
            BalanceQuery,
            Holiday,
            HolidayInput,
            PayrollRunRequest,
            PayrollPreview,
            PayrollStatus,
            PayslipDraft,
            Payslip,
            PayslipStatus,
            PayslipWithdrawInput
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Leave Type", description = "Leave type management APIs"),
        (name = "Leave Balance", description = "Leave balance ledger APIs"),
        (name = "Holiday", description = "Company holiday calendar APIs"),
        (name = "Payroll", description = "Payroll run and payslip APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
