use super::Member;
use crate::{
    common::diagnostic::DiagnosticKind,
    infer::{MemberKind, MemberSymbol, Solver, TypeInfo},
    trace::Outcome,
};

impl<'a> Solver<'a> {
    #[tracing::instrument(
        skip(self, constraint),
        fields(
            accessed = self.display_type_info(constraint.accessed).to_string().as_str(),
            name = self.rodeo.resolve(&constraint.name)
        )
    )]
    pub(in crate::infer) fn solve_member(&mut self, constraint: Member) -> Outcome {
        tracing::trace!("Solving member constraint");

        let Member {
            mut header,
            accessed,
            name,
            ty,
            resolver,
        } = constraint;
        let error = self.error_type();

        match self.get(self.get_base(accessed)) {
            TypeInfo::Error | TypeInfo::Never => {
                self.unify(ty, error);
                resolver.fail(MemberSymbol::Undefined, header.diagnostic, None);

                return Outcome::Failed;
            },
            _ => {},
        }

        let members = self.members_named(accessed, name);

        match members.as_slice() {
            [] => {
                header.diagnostic.fill(DiagnosticKind::MemberNotFound, vec![
                    self.rodeo.resolve(&name).to_string(),
                    self.display_type_info(accessed).to_string(),
                ]);

                self.unify(ty, error);
                resolver.fail(
                    MemberSymbol::Undefined,
                    header.diagnostic,
                    Some(&mut self.diagnostics),
                );

                Outcome::Failed
            },
            [member] => {
                let member_ty = self.member_type(accessed, *member);

                if self.unify(ty, member_ty) {
                    resolver.resolve(MemberSymbol::Member(*member));

                    Outcome::Resolved
                } else {
                    self.fill_mismatch(&mut header.diagnostic, ty, member_ty);
                    resolver.fail(
                        MemberSymbol::Member(*member),
                        header.diagnostic,
                        Some(&mut self.diagnostics),
                    );

                    Outcome::Failed
                }
            },
            members => {
                let functions = members
                    .iter()
                    .map(|member| match self.types.member(*member).kind {
                        MemberKind::Method(function) => function,
                        MemberKind::Field(_) => {
                            tracing::error!(
                                "Name '{}' is shared by a field and other members",
                                self.rodeo.resolve(&name)
                            );
                            unreachable!()
                        },
                    })
                    .collect();

                self.unify(ty, error);
                resolver.resolve(MemberSymbol::OverloadSet(functions));

                Outcome::Resolved
            },
        }
    }
}
