use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use battle_backend::middleware::request_context::RequestContext;
use battle_backend::routes;
use battle_backend::state::app_state::AppState;

/// In-process app over `state`: every production route behind
/// `RequestContext`. CORS is left out.
pub struct TestApp {
    state: AppState,
}

impl TestApp {
    pub async fn build(
        self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = Error> {
        test::init_service(
            App::new()
                .wrap(RequestContext)
                .app_data(web::Data::new(self.state))
                .configure(routes::configure),
        )
        .await
    }
}

pub fn create_test_app(state: AppState) -> TestApp {
    TestApp { state }
}
