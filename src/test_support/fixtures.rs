//! Header fixtures shared by unit tests.

/// First example header: overloads, an inline function, a struct and a class.
pub const EXAMPLE01: &str = r#"#include <memory>
#include <string>
#include <cmath>
#include <vector>
#include <algorithm>


namespace Example01
{
    ////////////////////////////////////////////////////////////////////
    // Basic functions bindings
    //////////////////////////////////////////////////////////////////////
    // (Note: this comment will also be published in the python stubs,
    // as a documentation for the users)

    // Simple add function (this will be the docstring)
    int add(int a, int b);

    int add(int a, int b, int c); // And this is a separate docstring, for this overload

    //This is also a docstring,
    // on multiple lines
    inline int sub(int a, int b) { return a - b; }

    ////////////////////////////////////////////////////////////////////
    // Classes and structs bindings
    ////////////////////////////////////////////////////////////////////

    // A default constructor with named parameters will
    // be automatically generated in python for structs
    struct Point
    {
        int x = 0;
        int y = 0;
    };

    // A class will publish only its public methods and members
    class Widget
    {
    public:
        Widget() = default;
        int get_value() const { return m_value; }
        void set_value(int v) { m_value = v; }
    private:
        int m_value = 0;
    };

}
"#;

/// Second example header: same shape as [`EXAMPLE01`] with documented fields.
pub const EXAMPLE02: &str = r#"#include <memory>
#include <string>
#include <cmath>
#include <vector>
#include <algorithm>


namespace Example02
{
    // Simple add function
    // Args:
    //     a: the first number
    //     b: the second number
    //
    // Returns: The sum of the two ints
    int add(int a, int b);

    int add(int a, int b, int c); // And this is a separate docstring, for this overload

    // This is also a docstring,
    // on multiple lines
    inline int sub(int a, int b) { return a - b; }

    ////////////////////////////////////////////////////////////////////
    // Classes and structs bindings
    ////////////////////////////////////////////////////////////////////

    // A default constructor with named parameters will
    // be automatically generated in python for structs
    struct Point
    {
        int x = 0;  // The x value
        int y = 0;  // the y value
    };

    // A class will publish only its public methods and members
    class Widget
    {
    public:
        Widget() = default;
        int get_value() const { return m_value; }
        void set_value(int v) { m_value = v; }
    private:
        int m_value = 0;
    };

}

"#;

/// A class with public methods around private state.
pub const WIDGET: &str = r#"// A class will publish only its public methods and members
class Widget
{
public:
    Widget() = default;
    int get_value() const { return m_value; }
    void set_value(int v) { m_value = v; }
private:
    int m_value = 0;
};
"#;

/// Constants, statics and out-of-line definitions in nested namespaces.
pub const GEOMETRY: &str = r#"namespace geo
{
    // Tolerance used by comparisons
    constexpr double epsilon = 1e-9;

    const int max_points = 64;

    int counter;

    namespace detail
    {
        int helper(int);
    }

    // A segment between two points
    class Segment
    {
    public:
        // Builds a segment of the given length
        explicit Segment(double length);
        double length() const;
        static Segment unit();
        double scale = 1.0;
    private:
        double m_length;
    };

    double Segment::length() const { return m_length * scale; }
}
"#;
