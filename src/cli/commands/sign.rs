//! Sign command implementation.

use crate::cli::{RuntimeConfig, SignArgs};
use crate::environment::SystemEnvironment;
use crate::error::Result;
use crate::signing::{Orchestrator, SignReport, SigningPlan};
use crate::tools::{SystemToolRunner, ToolKind};

/// Execute sign command
pub(super) async fn execute_sign(args: &SignArgs, config: &RuntimeConfig) -> Result<()> {
    let request = args.to_request(config.is_verbose());
    let env = SystemEnvironment;
    let runner = SystemToolRunner::new(request.config.tool_timeout);
    let orchestrator = Orchestrator::new(&env, &runner);

    if request.config.dry_run {
        config.section("ClickOnce signing plan (dry run)");
        let plan = orchestrator.plan(&request).await?;
        print_plan(&plan, config);
        config.success_println("Dry run complete; nothing was changed");
        return Ok(());
    }

    config.section(&format!("Signing {}", request.project));
    let report = orchestrator.run(&request).await?;
    print_report(&report, config);
    config.success_println(&format!(
        "Signed {} with certificate {}",
        report.target.folder_name, report.thumbprint
    ));
    Ok(())
}

fn print_plan(plan: &SigningPlan, config: &RuntimeConfig) {
    config.println(&format!("Target: {}", plan.target.directory.display()));
    config.println(&format!("Certificate: {}", plan.thumbprint));
    if plan.imports_certificate {
        config.indent("imported from bundle for this run, removed afterwards");
    }
    config.println(&format!("Payload files to toggle: {}", plan.payload_files.len()));
    for file in &plan.payload_files {
        config.verbose_println(&file.display().to_string());
    }
    if plan.pending_repair {
        config.warning_println("An interrupted run's journal will be repaired first");
    }

    config.println("\nSteps:");
    for (n, step) in plan.steps.iter().enumerate() {
        let _ = config.output().tool_step(n + 1, step);
    }
}

fn print_report(report: &SignReport, config: &RuntimeConfig) {
    if let Some(repaired) = &report.repaired {
        config.warning_println(&format!(
            "Repaired {} payload file(s) left stripped by an interrupted run",
            repaired.restored
        ));
    }

    let output = config.output();
    let _ = output.signed_pass(ToolKind::SignTool, &report.executables_signed);
    let _ = output.signed_pass(ToolKind::Mage, &report.manifests_signed);
    config.println(&format!("Payload files toggled: {}", report.payload_files));
    let _ = output.cleanup(&report.cleanup);
}
