use crate::{
    api::{
        attendance, attendance_admin, compensatory_leave, employee, expense_claim, leave_request,
        notification, project, reports, shift, travel_request, wfh,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    // finish() only fails for a zero period or burst, both ruled out above
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

fn attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/geo").route(web::post().to(attendance::geo_attendance)))
        .service(web::resource("/office-location").route(web::get().to(attendance::office_location)))
        .service(web::resource("/my").route(web::get().to(attendance::my_attendance)))
        .service(web::resource("/calendar").route(web::get().to(attendance::calendar)))
        .service(web::resource("/holidays").route(web::get().to(attendance::holidays_in_range)))
        // HR
        .service(web::resource("/bulk-checkout").route(web::post().to(attendance_admin::bulk_checkout)))
        .service(web::resource("/bulk-times").route(web::post().to(attendance_admin::bulk_update_times)))
        .service(
            web::resource("/pending-checkouts").route(web::get().to(attendance_admin::pending_checkouts)),
        )
        .service(web::resource("/records").route(web::get().to(attendance_admin::records_for_date)))
        .service(web::resource("/statistics").route(web::get().to(attendance_admin::statistics)))
        .service(web::resource("/today").route(web::get().to(attendance_admin::today_overview)))
        .service(web::resource("/absent").route(web::get().to(attendance_admin::absent_today)))
        .service(web::resource("/late").route(web::get().to(attendance_admin::late_today)))
        .service(web::resource("/by-date").route(web::get().to(attendance_admin::by_date)))
        // /attendance/{id}/...
        .service(
            web::resource("/{id}/manual-checkout").route(web::post().to(attendance_admin::manual_checkout)),
        )
        .service(web::resource("/{id}/times").route(web::put().to(attendance_admin::update_times)))
        .service(web::resource("/{id}").route(web::delete().to(attendance_admin::delete_attendance)));
}

fn leave_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(leave_request::leave_list))
            .route(web::post().to(leave_request::create_leave)),
    )
    .service(web::resource("/types").route(web::get().to(leave_request::leave_types)))
    .service(web::resource("/balances").route(web::get().to(leave_request::my_balances)))
    .service(
        web::resource("/balances/{employee_id}").route(web::get().to(leave_request::employee_balances)),
    )
    .service(web::resource("/allocations").route(web::post().to(leave_request::allocate_leave)))
    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
    .service(web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)))
    .service(web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)))
    .service(web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)));
}

fn workflow_doc_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/compensatory-leave")
            .service(
                web::resource("")
                    .route(web::get().to(compensatory_leave::list_compensatory))
                    .route(web::post().to(compensatory_leave::create_compensatory)),
            )
            .service(web::resource("/{id}").route(web::get().to(compensatory_leave::get_compensatory)))
            .service(
                web::resource("/{id}/{action}").route(web::put().to(compensatory_leave::decide_compensatory)),
            ),
    )
    .service(
        web::scope("/expense-claims")
            .service(
                web::resource("")
                    .route(web::get().to(expense_claim::list_expenses))
                    .route(web::post().to(expense_claim::create_expense)),
            )
            .service(web::resource("/summary").route(web::get().to(expense_claim::expense_summary)))
            .service(web::resource("/{id}").route(web::get().to(expense_claim::get_expense)))
            .service(web::resource("/{id}/{action}").route(web::put().to(expense_claim::decide_expense))),
    )
    .service(
        web::scope("/travel-requests")
            .service(
                web::resource("")
                    .route(web::get().to(travel_request::list_travel))
                    .route(web::post().to(travel_request::create_travel)),
            )
            .service(web::resource("/{id}").route(web::get().to(travel_request::get_travel)))
            .service(web::resource("/{id}/{action}").route(web::put().to(travel_request::decide_travel))),
    );
}

fn wfh_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/me").route(web::get().to(wfh::my_wfh)))
        .service(web::resource("/employees").route(web::get().to(wfh::wfh_employees)))
        .service(web::resource("/employees/{employee_id}").route(web::put().to(wfh::toggle_eligibility)))
        .service(
            web::resource("/requests")
                .route(web::get().to(wfh::my_requests))
                .route(web::post().to(wfh::create_request)),
        )
        .service(web::resource("/requests/pending").route(web::get().to(wfh::pending_requests)))
        .service(web::resource("/requests/all").route(web::get().to(wfh::all_requests)))
        .service(web::resource("/requests/{request_id}").route(web::delete().to(wfh::delete_request)))
        .service(web::resource("/requests/{request_id}/{action}").route(web::put().to(wfh::decide_request)));
}

fn project_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(
                web::resource("")
                    .route(web::get().to(project::list_projects))
                    .route(web::post().to(project::create_project)),
            )
            .service(web::resource("/{project_id}/members").route(web::post().to(project::add_members)))
            .service(
                web::resource("/{project_id}/members/{employee_id}")
                    .route(web::delete().to(project::remove_member)),
            )
            .service(web::resource("/{project_id}/summary").route(web::get().to(project::project_summary))),
    )
    .service(
        web::resource("/tasks")
            .route(web::get().to(project::list_tasks))
            .route(web::post().to(project::create_task)),
    )
    .service(
        web::resource("/task-logs")
            .route(web::get().to(project::list_task_logs))
            .route(web::post().to(project::create_task_log)),
    );
}

fn notification_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/devices/token").route(web::post().to(notification::register_device)))
        .service(
            web::scope("/notifications")
                .service(web::resource("").route(web::get().to(notification::inbox)))
                .service(web::resource("/unread-count").route(web::get().to(notification::unread_count)))
                .service(web::resource("/read-all").route(web::put().to(notification::mark_all_read)))
                .service(web::resource("/broadcast").route(web::post().to(notification::broadcast)))
                .service(
                    web::resource("/settings")
                        .route(web::get().to(notification::get_settings))
                        .route(web::put().to(notification::update_settings)),
                ),
        );
}

fn report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/summary").route(web::get().to(reports::summary)))
        .service(web::resource("/analytics").route(web::get().to(reports::analytics)))
        .service(web::resource("/weekly").route(web::get().to(reports::weekly)))
        .service(web::resource("/dashboard").route(web::get().to(reports::dashboard)))
        .service(web::resource("/departments").route(web::get().to(reports::departments)))
        .service(web::resource("/export").route(web::get().to(reports::export_report)))
        .service(web::resource("/history/{employee_id}").route(web::get().to(reports::employee_history)));
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::resource("/users")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(web::resource("/me").route(web::get().to(employee::current_employee)))
                    .service(web::resource("/count").route(web::get().to(employee::employee_count)))
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(web::resource("/departments").route(web::get().to(employee::departments)))
            .service(web::resource("/shifts").route(web::get().to(shift::list_shifts)))
            .service(web::resource("/shift-assignments").route(web::get().to(shift::shift_assignments)))
            .service(web::scope("/attendance").configure(attendance_routes))
            .service(web::scope("/leave").configure(leave_routes))
            .service(web::scope("/wfh").configure(wfh_routes))
            .service(web::scope("/reports").configure(report_routes))
            .configure(workflow_doc_routes)
            .configure(project_routes)
            .configure(notification_routes),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
