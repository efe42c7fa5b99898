use askama::Template;
use askama_web::WebTemplate;

use crate::api;

use super::Notice;

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub notice: Option<Notice>,
    pub is_admin: bool,
    pub email: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub notice: Option<Notice>,
    pub name: String,
    pub email: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "customer_dashboard.html")]
pub struct CustomerDashboard {
    pub notice: Option<Notice>,
    pub customer: api::User,
    pub requests: Vec<api::ServiceRequest>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboard {
    pub notice: Option<Notice>,
    pub admin: api::User,
    pub customers: Vec<api::User>,
    pub requests: Vec<api::ServiceRequest>,
}
