//! Response-shape cases for the HProject endpoints.

use chrono::Utc;

use crate::error::{ContractError, ContractResult};
use crate::model::HProject;
use crate::properties::{
    self, DEVICE_REFERENCE_IN_PACKET, PAGINATED_RESULTS, PROJECT_CARD,
    PROJECT_REFERENCE_IN_DEVICE, USER_REFERENCE_IN_PROJECT,
};
use crate::request::HttpRequestBuilder;
use crate::suite::{CaseContext, CaseFuture, ContractSuite};
use crate::validator::ResponseValidator;

/// Name of the suite.
pub const SUITE_NAME: &str = "hproject";

/// Returns the HProject suite.
pub fn suite() -> ContractSuite {
    ContractSuite::new(SUITE_NAME)
        .with_fn("test001_save_hproject", save_hproject)
        .with_fn("test002_find_hproject", find_hproject)
        .with_fn("test003_update_hproject", update_hproject)
        .with_fn("test004_delete_hproject", delete_hproject)
        .with_fn("test005_find_all_hprojects", find_all_hprojects)
        .with_fn(
            "test006_find_all_hprojects_paginated",
            find_all_hprojects_paginated,
        )
        .with_fn("test007_cards_view", cards_view)
        .with_fn("test008_tree_view", tree_view)
        .with_fn("test009_area_list", area_list)
        .with_fn("test010_update_owner", update_owner)
}

/// Full project view with its owner reference.
fn project_validator() -> ResponseValidator {
    ResponseValidator::builder()
        .with_status_equal(200)
        .contain_exact_properties(properties::project())
        .contain_exact_inner_properties("user", USER_REFERENCE_IN_PROJECT.iter().copied())
        .build()
}

fn save_hproject(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let project = ctx.fixtures().new_project();
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::post())
                    .with_uri("/hprojects")
                    .with_json_body(&project),
            )
            .await?;
        ctx.check(&request, &response, &project_validator())?;

        let saved: HProject = response.entity()?;
        ensure(saved.name == project.name, "saved name differs")?;
        ensure(
            saved.description == project.description,
            "saved description differs",
        )?;
        ensure(
            saved.user.map(|u| u.id) == Some(ctx.session().user_id()),
            "saved owner is not the admin",
        )
    })
}

fn find_hproject(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let project = ctx.fixtures().create_project().await?;
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::get())
                    .with_uri(format!("/hprojects/{}", project.id)),
            )
            .await?;
        ctx.check(&request, &response, &project_validator())?;

        let found: HProject = response.entity()?;
        ensure(found.name == project.name, "found name differs")?;
        ensure(
            found.description == project.description,
            "found description differs",
        )?;
        ensure(
            found.user.map(|u| u.id) == Some(ctx.session().user_id()),
            "found owner is not the admin",
        )
    })
}

fn update_hproject(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let project = ctx.fixtures().create_project().await?;
        let updated = HProject {
            description: Some(format!("New description in data : {}", Utc::now())),
            ..project.clone()
        };
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::put())
                    .with_uri("/hprojects")
                    .with_json_body(&updated),
            )
            .await?;
        ctx.check(&request, &response, &project_validator())?;

        // only the description may change
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::get())
                    .with_uri(format!("/hprojects/{}", project.id)),
            )
            .await?;
        ctx.check(&request, &response, &project_validator())?;
        let fetched: HProject = response.entity()?;
        ensure(
            fetched.description == updated.description,
            "description was not updated",
        )?;
        ensure(fetched.name == project.name, "name changed on update")?;
        ensure(
            fetched.user.map(|u| u.id) == project.user.map(|u| u.id),
            "owner changed on update",
        )
    })
}

fn delete_hproject(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let project = ctx.fixtures().create_project().await?;
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::delete())
                    .with_uri(format!("/hprojects/{}", project.id)),
            )
            .await?;
        let validator = ResponseValidator::builder()
            .with_status_equal(200)
            .with_custom_criteria("empty body", |r| r.body().is_empty())
            .build();
        ctx.check(&request, &response, &validator)
    })
}

fn find_all_hprojects(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        ctx.fixtures().create_project().await?;
        ctx.fixtures().create_project().await?;
        let (request, response) = ctx
            .send(ctx.as_admin(HttpRequestBuilder::get()).with_uri("/hprojects/all"))
            .await?;
        ctx.check(&request, &response, &project_validator())
    })
}

fn find_all_hprojects_paginated(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        ctx.fixtures().create_project().await?;
        ctx.fixtures().create_project().await?;
        let config = ctx.client().config();
        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::get())
                    .with_uri("/hprojects")
                    .with_parameter("delta", config.default_delta.to_string())
                    .with_parameter("page", config.default_page.to_string()),
            )
            .await?;
        let validator = ResponseValidator::builder()
            .with_status_equal(200)
            .contain_exact_paginated_properties()
            .contain_exact_inner_properties(PAGINATED_RESULTS, properties::project())
            .contain_exact_inner_properties(
                &format!("{}.user", PAGINATED_RESULTS),
                USER_REFERENCE_IN_PROJECT.iter().copied(),
            )
            .build();
        ctx.check(&request, &response, &validator)
    })
}

fn cards_view(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        ctx.fixtures().create_project().await?;
        let (request, response) = ctx
            .send(ctx.as_admin(HttpRequestBuilder::get()).with_uri("/hprojects/all/cards"))
            .await?;
        let validator = ResponseValidator::builder()
            .with_status_equal(200)
            .contain_exact_properties(PROJECT_CARD.iter().copied())
            .build();
        ctx.check(&request, &response, &validator)
    })
}

fn tree_view(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let fixtures = ctx.fixtures();
        let project = fixtures.create_project().await?;
        let device = fixtures.create_device(&project).await?;
        let packet = fixtures.create_packet(&device).await?;
        fixtures.create_field(&packet).await?;

        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::get())
                    .with_uri(format!("/hprojects/{}/tree", project.id)),
            )
            .await?;
        let validator = ResponseValidator::builder()
            .with_status_equal(200)
            .contain_exact_properties(properties::packet())
            .contain_exact_inner_properties("device", DEVICE_REFERENCE_IN_PACKET.iter().copied())
            .contain_exact_inner_properties("fields", properties::field_in_packet())
            .contain_exact_inner_properties(
                "device.project",
                PROJECT_REFERENCE_IN_DEVICE.iter().copied(),
            )
            .build();
        ctx.check(&request, &response, &validator)
    })
}

fn area_list(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let fixtures = ctx.fixtures();
        let project = fixtures.create_project().await?;
        fixtures.create_area(&project).await?;

        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::get())
                    .with_uri(format!("/hprojects/{}/areas", project.id)),
            )
            .await?;
        let validator = ResponseValidator::builder()
            .with_status_equal(200)
            .contain_exact_properties(properties::area())
            .build();
        ctx.check(&request, &response, &validator)
    })
}

fn update_owner(ctx: &CaseContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let fixtures = ctx.fixtures();
        let project = fixtures.create_project().await?;
        let user = fixtures.create_user().await?;

        let (request, response) = ctx
            .send(
                ctx.as_admin(HttpRequestBuilder::put())
                    .with_uri(format!("/hprojects/{}/owner/{}", project.id, user.id)),
            )
            .await?;
        ctx.check(&request, &response, &project_validator())
    })
}

fn ensure(condition: bool, message: &str) -> ContractResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ContractError::Assertion {
            context: message.to_string(),
            mismatches: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_registers_ten_cases_in_order() {
        let names = suite().case_names().into_iter().map(String::from).collect::<Vec<_>>();
        assert_eq!(names.len(), 10);
        assert_eq!(names.first().map(String::as_str), Some("test001_save_hproject"));
        assert_eq!(names.last().map(String::as_str), Some("test010_update_owner"));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_project_validator_expects_owner_reference() {
        let validator = format!("{:?}", project_validator());
        assert!(validator.contains("imagePath"));
        assert!(validator.contains("entityVersion"));
    }
}
