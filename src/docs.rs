use crate::api::{
    attendance::{MarkAttendance, PresentStaff},
    dashboard::Dashboard,
    department::{CreateDepartment, DepartmentDetail, UpdateDepartment},
    employee::{CreateEmployee, EmployeeDetail, UpdateEmployee},
    holiday::HolidayPayload,
    leave::{CreateLeave, LeaveDecision},
    overtime::{CreateOvertime, OvertimeDecision, OvertimeView},
    overtime_plan::{CreatePlan, NewSchedule, PlanView},
    payroll::{CreatePayroll, PayrollQuery, StaffPay, UpdatePayroll},
    recruitment::{CandidatePayload, CreateJobAd, UpdateJobAd},
};
use crate::auth::handlers::MeResponse;
use crate::model::{
    attendance::{Attendance, AttendanceStatus},
    department::Department,
    employee::{Employee, Gender, Language},
    holiday::Holiday,
    leave_application::{LeaveApplication, LeaveType},
    overtime::OvertimeSchedule,
    payroll::Payroll,
    recruitment::{JobAdvertisement, JobApplication, Recruitment},
};
use crate::models::{LoginReqDto, RoleAssignment, UserReq};
use crate::utils::pagination::{DepartmentPage, EmployeePage, LeavePage, PayrollPage};
use crate::workflow::{
    ApprovalStep, ApproverRole, ChainStatus, Decision, HrStatus, OvertimeStatus, Verdict,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM System API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) System

This API powers a **Human Resource Management (HRM)** system: employee
records, departments, attendance, leave, overtime approval and pay,
holidays, recruitment and payroll.

### Key Features
- **Employee & Department Management**
- **Attendance**: daily check-in and check-out, HR marking
- **Leave**: apply, HR approve/reject with a comment, own history
- **Overtime**: five-step approval chain (supervisor, department head, HR, CFO, CEO);
  double pay on Sundays and holidays, time and a half otherwise
- **Overtime plans**: scheduled overtime signed off by HR and CFO
- **Holidays**: calendar driving the overtime multiplier
- **Recruitment**: public careers pages, walk-in candidates, job advertisements
- **Payroll**: monthly records including approved overtime pay

### Security
Endpoints under `/api` require a **JWT Bearer** access token.
Roles: Admin, HR, Employee, Supervisor, Department head, CFO, CEO.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,
        crate::auth::handlers::assign_role,

        crate::api::dashboard::dashboard,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::department::create_department,
        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::update_department,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::check_out_employee,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::present_today,

        crate::api::leave::create_leave,
        crate::api::leave::list_leaves,
        crate::api::leave::my_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::overtime::apply_overtime,
        crate::api::overtime::list_overtime,
        crate::api::overtime::my_overtime,
        crate::api::overtime::get_overtime,
        crate::api::overtime::decide_overtime,

        crate::api::overtime_plan::create_plan,
        crate::api::overtime_plan::list_plans,
        crate::api::overtime_plan::get_plan,
        crate::api::overtime_plan::add_schedule,
        crate::api::overtime_plan::decide_plan,

        crate::api::holiday::create_holiday,
        crate::api::holiday::list_holidays,
        crate::api::holiday::get_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::recruitment::submit_walk_in,
        crate::api::recruitment::open_jobs,
        crate::api::recruitment::get_open_job,
        crate::api::recruitment::apply_for_job,
        crate::api::recruitment::list_candidates,
        crate::api::recruitment::delete_candidate,
        crate::api::recruitment::create_job_ad,
        crate::api::recruitment::list_job_ads,
        crate::api::recruitment::get_job_ad,
        crate::api::recruitment::update_job_ad,
        crate::api::recruitment::delete_job_ad,
        crate::api::recruitment::list_applications,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::staff_pay
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            RoleAssignment,
            MeResponse,
            Dashboard,
            Employee,
            Gender,
            Language,
            CreateEmployee,
            UpdateEmployee,
            EmployeeDetail,
            EmployeePage,
            Department,
            CreateDepartment,
            UpdateDepartment,
            DepartmentDetail,
            DepartmentPage,
            Attendance,
            AttendanceStatus,
            MarkAttendance,
            PresentStaff,
            LeaveApplication,
            LeaveType,
            HrStatus,
            CreateLeave,
            LeaveDecision,
            LeavePage,
            Decision,
            Verdict,
            ApproverRole,
            ApprovalStep,
            ChainStatus,
            OvertimeStatus,
            CreateOvertime,
            OvertimeDecision,
            OvertimeView,
            CreatePlan,
            NewSchedule,
            PlanView,
            OvertimeSchedule,
            Holiday,
            HolidayPayload,
            Recruitment,
            JobAdvertisement,
            JobApplication,
            CandidatePayload,
            CreateJobAd,
            UpdateJobAd,
            Payroll,
            PayrollPage,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            StaffPay
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token APIs"),
        (name = "Dashboard", description = "Headline counts"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Overtime", description = "Overtime applications and approval chain"),
        (name = "Overtime plan", description = "Planned overtime schedules"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Careers", description = "Public recruitment pages"),
        (name = "Recruitment", description = "Candidates and job advertisements"),
        (name = "Payroll", description = "Payroll management APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the protected paths refer to.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_declares_bearer_scheme_and_chain_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/overtime/{overtime_id}/decision"));
        assert!(doc.paths.paths.contains_key("/careers/jobs"));
    }
}
