use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers::{
    acts, auth, customers, health, labeled, lots, meters, pre_catastrals, reports, roles,
    technicians, users,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/auth/login", post(auth::login));

    let act_routes = Router::new()
        .route("/newact", post(acts::create_act))
        .route("/listacts", get(acts::list_acts))
        .route("/getact", get(acts::get_act))
        .route("/updateact", put(acts::update_act))
        .route("/deleteact", delete(acts::delete_act))
        .route("/history", get(acts::act_history));

    let pre_catastral_routes = Router::new()
        .route("/newprecatastral", post(pre_catastrals::create_pre_catastral))
        .route("/listprecatastrals", get(pre_catastrals::list_pre_catastrals))
        .route("/getprecatastral", get(pre_catastrals::get_pre_catastral))
        .route("/updateprecatastral", put(pre_catastrals::update_pre_catastral))
        .route("/deleteprecatastral", delete(pre_catastrals::delete_pre_catastral))
        .route("/history", get(pre_catastrals::pre_catastral_history));

    let lot_routes = Router::new()
        .route("/newlot", post(lots::create_lot))
        .route("/listlots", get(lots::list_lots))
        .route("/activelot", get(lots::active_lot))
        .route("/updatelot", put(lots::update_lot))
        .route("/activatelot", put(lots::activate_lot))
        .route("/deletelot", delete(lots::delete_lot));

    let labeled_routes = Router::new()
        .route("/newlabeled", post(labeled::create_labeled))
        .route("/listlabeled", get(labeled::list_labeled))
        .route("/getlabeled", get(labeled::get_labeled))
        .route("/updatelabeled", put(labeled::update_labeled))
        .route("/deletelabeled", delete(labeled::delete_labeled))
        .route("/history", get(labeled::labeled_history));

    let customer_routes = Router::new()
        .route("/newcustomer", post(customers::create_customer))
        .route("/listcustomers", get(customers::list_customers))
        .route("/getcustomer", get(customers::get_customer))
        .route("/updatecustomer", put(customers::update_customer));

    let technician_routes = Router::new()
        .route("/newtechnician", post(technicians::create_technician))
        .route("/listtechnicians", get(technicians::list_technicians))
        .route("/updatetechnician", put(technicians::update_technician))
        .route("/deletetechnician", delete(technicians::delete_technician));

    let meter_routes = Router::new()
        .route("/newmeter", post(meters::create_meter))
        .route("/listmeters", get(meters::list_meters))
        .route("/updatemeter", put(meters::update_meter));

    let user_routes = Router::new()
        .route("/newuser", post(users::create_user))
        .route("/listusers", get(users::list_users))
        .route("/updateuser", put(users::update_user))
        .route("/deleteuser", delete(users::delete_user));

    let role_routes = Router::new()
        .route("/newrole", post(roles::create_role))
        .route("/listroles", get(roles::list_roles))
        .route("/updaterole", put(roles::update_role))
        .route("/deleterole", delete(roles::delete_role));

    let report_routes = Router::new()
        .route("/acts", get(reports::acts_report))
        .route("/precatastrals", get(reports::pre_catastrals_report));

    // Every route below resolves an `AuthUser` from the bearer token.
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/permission/listpermissions", get(roles::list_permissions))
        .nest("/api/act", act_routes)
        .nest("/api/precatastral", pre_catastral_routes)
        .nest("/api/lot", lot_routes)
        .nest("/api/labeled", labeled_routes)
        .nest("/api/customer", customer_routes)
        .nest("/api/technician", technician_routes)
        .nest("/api/meter", meter_routes)
        .nest("/api/user", user_routes)
        .nest("/api/role", role_routes)
        .nest("/api/report", report_routes);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)))
        .with_state(state)
}
