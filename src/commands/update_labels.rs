//! `update-labels`: copy the labels of one project to others.

use crate::error::Result;
use crate::output::print_info;
use crate::service::{copy_labels, service_for, GitService, Label, ProjectRef, ServiceKind};

use super::Context;

/// Destinations may be given as separate arguments or `;`-separated.
pub fn parse_destinations(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(';'))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Copy `labels` to every destination, connecting through `connect`.
///
/// Stops at the first destination that fails. Returns how many labels were
/// created per destination.
pub(crate) fn update_labels_with<F>(
    labels: &[Label],
    destinations: &[String],
    connect: F,
) -> Result<Vec<(String, usize)>>
where
    F: Fn(&str) -> Result<Box<dyn GitService>>,
{
    let mut copied = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let service = connect(destination)?;
        let created = copy_labels(labels, service.as_ref())?;
        copied.push((destination.clone(), created));
    }
    Ok(copied)
}

pub fn update_labels_command(
    ctx: &Context,
    source_repo: Option<&str>,
    kind: ServiceKind,
    destinations: &[String],
) -> Result<()> {
    let source = ctx.service(ctx.project_for_arg(source_repo)?)?;
    let labels = source.list_labels()?;
    if labels.is_empty() {
        print_info("No labels.");
        return Ok(());
    }

    let destinations = parse_destinations(destinations);
    let copied = update_labels_with(&labels, &destinations, |destination| {
        let project = ProjectRef::from_arg(destination, kind.default_host())?;
        Ok(service_for(kind, project))
    })?;

    for (destination, created) in copied {
        println!(
            "{} labels of {} copied to {}",
            created,
            labels.len(),
            destination
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpsintError;
    use crate::service::fake::FakeService;

    fn labels() -> Vec<Label> {
        vec![
            Label::new("bug", "#d73a4a", "Something isn't working"),
            Label::new("kind/feature", "a2eeef", ""),
        ]
    }

    #[test]
    fn test_parse_destinations() {
        let args = vec![
            "packit/ogr;packit/upsint".to_string(),
            " gitlab.com/group/project ".to_string(),
            ";".to_string(),
        ];
        assert_eq!(
            parse_destinations(&args),
            vec!["packit/ogr", "packit/upsint", "gitlab.com/group/project"]
        );
    }

    #[test]
    fn test_update_labels_counts_per_destination() {
        let destinations = vec!["packit/ogr".to_string(), "packit/upsint".to_string()];

        let copied = update_labels_with(&labels(), &destinations, |destination| {
            let project = ProjectRef::from_arg(destination, "github.com")?;
            let service = FakeService::new(project);
            if destination == "packit/upsint" {
                service.labels.borrow_mut().push(Label::new("bug", "ffffff", ""));
            }
            Ok(Box::new(service) as Box<dyn GitService>)
        })
        .unwrap();

        assert_eq!(
            copied,
            vec![
                ("packit/ogr".to_string(), 2),
                ("packit/upsint".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_update_labels_invalid_destination() {
        let destinations = vec!["not-a-repo".to_string()];
        let result = update_labels_with(&labels(), &destinations, |destination| {
            let project = ProjectRef::from_arg(destination, "github.com")?;
            Ok(Box::new(FakeService::new(project)) as Box<dyn GitService>)
        });
        assert!(matches!(result, Err(UpsintError::InvalidRepository(_))));
    }
}
